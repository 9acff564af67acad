//! Rope: persistent tree-structured text
//!
//! A [`Rope`] is an immutable character sequence stored as a binary tree
//! of leaves (runs of text) and internal nodes (concatenations). Every
//! edit produces a new rope that shares all untouched subtrees with the
//! old one, so keeping earlier versions alive (for undo, snapshots,
//! renderers) costs only the nodes along the edited path.
//!
//! # Shape policy
//!
//! Three constants from [`RopeConfig`] govern the tree:
//!
//! - concatenations shorter than `fusion_threshold` collapse into one leaf
//! - a concatenation deeper than `depth_threshold` whose children differ in
//!   depth by more than `balance_factor` times is rebuilt from its text
//! - text is built into leaves of at most `node_size` characters
//!
//! # Example
//!
//! ```rust
//! use editkit_core::Rope;
//!
//! let rope = Rope::create("123456789\n123456789\n");
//! let edited = rope.insert_at(17, "abc").unwrap();
//!
//! assert_eq!(edited.to_text(), "123456789\n1234567abc89\n");
//! assert_eq!(rope.to_text(), "123456789\n123456789\n"); // unchanged
//! assert_eq!(edited.newline_count(), 2);
//! ```

mod iter;
mod lines;
mod node;

pub use iter::Chunks;

use crate::config::RopeConfig;
use crate::error::{EditError, Result};
use node::Node;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Immutable text rope
///
/// Cloning is O(1): clones share the whole tree. Lengths and offsets are
/// counted in `char`s.
#[derive(Clone)]
pub struct Rope {
    root: Arc<Node>,
    config: RopeConfig,
}

impl Rope {
    /// Create an empty rope with the default configuration
    pub fn new() -> Self {
        Self {
            root: Node::empty(),
            config: RopeConfig::default(),
        }
    }

    /// Build a rope from text with the default configuration
    ///
    /// Text longer than the node size is bisected recursively, so the
    /// result is near-balanced with depth about `log2(len / node_size)`.
    pub fn create(text: &str) -> Self {
        Self::with_config(text, RopeConfig::default())
    }

    /// Build a rope from text with an explicit shape policy
    pub fn with_config(text: &str, config: RopeConfig) -> Self {
        Self {
            root: Node::build(text, &config),
            config,
        }
    }

    fn from_root(root: Arc<Node>, config: RopeConfig) -> Self {
        Self { root, config }
    }

    /// Number of characters
    pub fn len(&self) -> usize {
        self.root.len()
    }

    pub fn is_empty(&self) -> bool {
        self.root.len() == 0
    }

    /// Number of `'\n'` characters
    pub fn newline_count(&self) -> usize {
        self.root.newlines()
    }

    /// Number of lines, counting a final unterminated (possibly empty) line
    pub fn line_count(&self) -> usize {
        self.root.newlines() + 1
    }

    /// Tree depth; a single leaf has depth 1
    pub fn depth(&self) -> usize {
        self.root.depth()
    }

    pub fn leaf_count(&self) -> usize {
        self.root.leaf_count()
    }

    pub fn config(&self) -> &RopeConfig {
        &self.config
    }

    /// Whether both handles point at the same root node
    pub fn ptr_eq(&self, other: &Rope) -> bool {
        Arc::ptr_eq(&self.root, &other.root)
    }

    /// Concatenate two ropes
    ///
    /// Uses this rope's configuration for fusion and rebalancing. Either
    /// side being empty returns the other unchanged.
    pub fn concat(&self, other: &Rope) -> Rope {
        Self::from_root(
            Node::concat(Arc::clone(&self.root), Arc::clone(&other.root), &self.config),
            self.config,
        )
    }

    /// Split into `[0, index)` and `[index, len)`
    ///
    /// Leaves are split as views over the same storage; no characters are
    /// copied. Splitting at `0` or `len` yields an empty rope and this one.
    ///
    /// # Errors
    ///
    /// Returns `EditError::Index` if `index > len`
    pub fn split(&self, index: usize) -> Result<(Rope, Rope)> {
        self.check_index(index)?;
        let (left, right) = Node::split(&self.root, index, &self.config);
        Ok((
            Self::from_root(left, self.config),
            Self::from_root(right, self.config),
        ))
    }

    /// Insert text at `index`
    ///
    /// # Errors
    ///
    /// Returns `EditError::Index` if `index > len`
    pub fn insert_at(&self, index: usize, text: &str) -> Result<Rope> {
        self.insert_rope(index, &Rope::with_config(text, self.config))
    }

    /// Insert a single character at `index`
    pub fn insert_char(&self, index: usize, ch: char) -> Result<Rope> {
        let mut buf = [0u8; 4];
        self.insert_at(index, ch.encode_utf8(&mut buf))
    }

    /// Insert another rope at `index`, sharing its nodes
    pub fn insert_rope(&self, index: usize, rope: &Rope) -> Result<Rope> {
        let (left, right) = self.split(index)?;
        Ok(left.concat(rope).concat(&right))
    }

    /// Insert a character, appending directly into leaf storage when possible
    ///
    /// When `index` is the end of a leaf that still has room, the leaf and
    /// every node above it are updated in place if this handle is their
    /// only owner. Shared nodes are copied first, and a leaf whose storage
    /// is visible to another view gets fresh storage, so no other rope
    /// ever observes the new character. Any other `index` falls back to
    /// [`Rope::insert_char`].
    ///
    /// Returns whether the character was written into existing storage.
    ///
    /// # Errors
    ///
    /// Returns `EditError::Index` if `index > len`; the rope is unchanged.
    pub fn insert_char_in_place(&mut self, ch: char, index: usize) -> Result<bool> {
        self.check_index(index)?;

        let eligible = self
            .root
            .leaf_ending_at(index)
            .is_some_and(|leaf| leaf.len() < self.config.node_size);

        if !eligible {
            tracing::trace!(index, "char insert falls back to split/concat");
            *self = self.insert_char(index, ch)?;
            return Ok(false);
        }

        let in_place = Node::push_char(&mut self.root, ch, index);
        tracing::trace!(index, in_place, "appended char to leaf");
        Ok(in_place)
    }

    /// Remove `[start, end)`, returning `(cut, remainder)`
    ///
    /// # Errors
    ///
    /// Returns `EditError::Range` if `start > end` or `end > len`
    pub fn delete_range(&self, start: usize, end: usize) -> Result<(Rope, Rope)> {
        self.check_range(start, end)?;
        let (left, rest) = self.split(start)?;
        let (middle, right) = rest.split(end - start)?;
        Ok((middle, left.concat(&right)))
    }

    /// Copy `[start, end)` without touching this rope
    ///
    /// # Errors
    ///
    /// Returns `EditError::Range` if `start > end` or `end > len`
    pub fn copy_range(&self, start: usize, end: usize) -> Result<Rope> {
        self.check_range(start, end)?;
        let (_, rest) = self.split(start)?;
        let (middle, _) = rest.split(end - start)?;
        Ok(middle)
    }

    /// Character at `pos`
    ///
    /// # Errors
    ///
    /// Returns `EditError::Index` if `pos >= len`
    pub fn char_at(&self, pos: usize) -> Result<char> {
        if pos >= self.len() {
            return Err(EditError::Index {
                index: pos,
                length: self.len(),
            });
        }
        self.root.char_at(pos).ok_or(EditError::Index {
            index: pos,
            length: self.len(),
        })
    }

    /// Rebuild from text into a near-minimal-depth tree
    pub fn rebalance(&self) -> Rope {
        Self::from_root(Node::rebalance(&self.root, &self.config), self.config)
    }

    /// Depth-ratio check at the root only
    ///
    /// Children are balanced by construction: every concatenation checks
    /// and repairs the node it creates.
    pub fn is_balanced(&self) -> bool {
        self.root.is_balanced(self.config.balance_factor)
    }

    /// Render the tree shape, leaves quoted and internal nodes as
    /// `(left right)`
    ///
    /// ```rust
    /// use editkit_core::{Rope, RopeConfig};
    ///
    /// let config = RopeConfig { fusion_threshold: 0, ..RopeConfig::default() };
    /// let rope = Rope::with_config("ab", config).concat(&Rope::with_config("cd", config));
    /// assert_eq!(rope.debug_tree(), r#"("ab" "cd")"#);
    /// ```
    pub fn debug_tree(&self) -> String {
        let mut out = String::new();
        self.root.write_tree(&mut out);
        out
    }

    /// Leaf text slices in order
    pub fn chunks(&self) -> Chunks<'_> {
        Chunks::new(&*self.root)
    }

    pub fn chars(&self) -> impl Iterator<Item = char> + '_ {
        self.chunks().flat_map(str::chars)
    }

    /// Render the full text
    pub fn to_text(&self) -> String {
        let mut out = String::with_capacity(self.len());
        self.root.write_text(&mut out);
        out
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index > self.len() {
            return Err(EditError::Index {
                index,
                length: self.len(),
            });
        }
        Ok(())
    }

    fn check_range(&self, start: usize, end: usize) -> Result<()> {
        if start > end || end > self.len() {
            return Err(EditError::Range {
                start,
                end,
                length: self.len(),
            });
        }
        Ok(())
    }
}

impl Default for Rope {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&str> for Rope {
    fn from(text: &str) -> Self {
        Self::create(text)
    }
}

impl From<String> for Rope {
    fn from(text: String) -> Self {
        Self::create(&text)
    }
}

impl PartialEq for Rope {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.chars().eq(other.chars())
    }
}

impl Eq for Rope {}

impl std::fmt::Display for Rope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for chunk in self.chunks() {
            f.write_str(chunk)?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for Rope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Rope({:?})", self.to_text())
    }
}

impl Serialize for Rope {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Rope {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        Ok(Rope::create(&text))
    }
}
