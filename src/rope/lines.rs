//! Line/offset addressing over per-node newline counts
//!
//! Line `n` starts just after the `n`-th `'\n'`; line 0 starts at offset 0.
//! All queries descend the tree once, so they are O(depth) plus a scan of
//! one leaf.

use super::node::Node;
use super::Rope;
use crate::error::{EditError, Missing, Result};
use crate::{LineNumber, Offset};

impl Node {
    fn line_start(&self, line: usize) -> Option<usize> {
        match self {
            Node::Leaf(leaf) => {
                if line == 0 {
                    return Some(0);
                }
                leaf.as_str()
                    .chars()
                    .enumerate()
                    .filter(|&(_, ch)| ch == '\n')
                    .nth(line - 1)
                    .map(|(pos, _)| pos + 1)
            }
            Node::Internal(inner) => {
                let left_newlines = inner.left.newlines();
                if line <= left_newlines {
                    inner.left.line_start(line)
                } else {
                    inner
                        .right
                        .line_start(line - left_newlines)
                        .map(|offset| offset + inner.left.len())
                }
            }
        }
    }

    fn line_of(&self, pos: usize) -> usize {
        match self {
            Node::Leaf(leaf) => leaf.as_str().chars().take(pos).filter(|&ch| ch == '\n').count(),
            Node::Internal(inner) => {
                let left_len = inner.left.len();
                if pos < left_len {
                    inner.left.line_of(pos)
                } else {
                    inner.left.newlines() + inner.right.line_of(pos - left_len)
                }
            }
        }
    }
}

impl Rope {
    /// Offset of the first character of `line`
    ///
    /// # Errors
    ///
    /// Returns `EditError::NotFound` if the rope has fewer than `line`
    /// newlines
    pub fn line_start_offset(&self, line: LineNumber) -> Result<Offset> {
        if line > self.newline_count() {
            return Err(EditError::NotFound(Missing::Line(line)));
        }
        self.root
            .line_start(line)
            .ok_or(EditError::NotFound(Missing::Line(line)))
    }

    /// Line containing `pos`
    ///
    /// `pos == len` is the position after the last character and belongs
    /// to the final line.
    ///
    /// # Errors
    ///
    /// Returns `EditError::Index` if `pos > len`
    pub fn line_of_offset(&self, pos: Offset) -> Result<LineNumber> {
        if pos > self.len() {
            return Err(EditError::Index {
                index: pos,
                length: self.len(),
            });
        }
        Ok(self.root.line_of(pos))
    }

    /// Length of `line` including its terminating newline
    ///
    /// Only terminated lines have a length: the final line after the last
    /// `'\n'` has no following line start, so querying it fails.
    ///
    /// # Errors
    ///
    /// Returns `EditError::NotFound` if `line + 1` has no start
    pub fn line_length(&self, line: LineNumber) -> Result<usize> {
        let start = self.line_start_offset(line)?;
        let next = self
            .line_start_offset(line + 1)
            .map_err(|_| EditError::NotFound(Missing::Line(line)))?;
        Ok(next - start)
    }

    /// Offset of `(line, column)`
    ///
    /// # Errors
    ///
    /// Returns `EditError::NotFound` if the line has no length or
    /// `column >= line_length(line)`
    pub fn offset_of_coordinate(&self, line: LineNumber, column: usize) -> Result<Offset> {
        let start = self.line_start_offset(line)?;
        if column >= self.line_length(line)? {
            return Err(EditError::NotFound(Missing::Column { line, column }));
        }
        Ok(start + column)
    }
}
