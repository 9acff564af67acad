//! Buffer: a mark-aware editing session over one rope
//!
//! A [`Buffer`] owns the current [`Rope`], the cursor, an optional
//! selection end, named marks and the undo/redo history. Every edit goes
//! through the buffer so that marks follow the text and each change is
//! recorded as an [`UndoRecord`].
//!
//! # Failure model
//!
//! Operations validate their arguments before touching any field. A
//! failed call returns an [`EditError`] and leaves text, positions and
//! history exactly as they were.
//!
//! # Example
//!
//! ```rust
//! use editkit_core::Buffer;
//!
//! let mut buffer = Buffer::from_text("Hello World");
//! buffer.set_mark_at("world", 6).unwrap();
//!
//! buffer.insert_at(", dear", 5).unwrap();
//! assert_eq!(buffer.text(), "Hello, dear World");
//! assert_eq!(buffer.get_mark("world").unwrap(), 12);
//!
//! buffer.undo().unwrap();
//! assert_eq!(buffer.text(), "Hello World");
//! assert_eq!(buffer.get_mark("world").unwrap(), 6);
//! ```

mod mark;
mod undo;

pub use undo::UndoRecord;

use crate::config::BufferConfig;
use crate::error::{EditError, Missing, Result};
use crate::rope::Rope;
use crate::{LineNumber, Offset};
use mark::Positions;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use uuid::Uuid;

/// Unique identifier for an editing session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BufferId(Uuid);

impl BufferId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for BufferId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for BufferId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn position_error(position: usize, length: usize) -> EditError {
    EditError::Position {
        position: Some(position),
        length,
    }
}

/// Editing session over one rope
#[derive(Debug)]
pub struct Buffer {
    id: BufferId,
    config: BufferConfig,
    rope: Rope,
    positions: Positions,

    /// Most recent record at the back
    undo_stack: VecDeque<UndoRecord>,
    redo_stack: Vec<UndoRecord>,

    /// Records collected while a [`Buffer::group`] is running
    pending: Option<Vec<UndoRecord>>,

    modified: bool,
}

impl Buffer {
    /// Create an empty buffer with the default configuration
    pub fn new() -> Self {
        Self::with_config(BufferConfig::default())
    }

    pub fn with_config(config: BufferConfig) -> Self {
        Self {
            id: BufferId::new(),
            rope: Rope::with_config("", config.rope),
            config,
            positions: Positions::default(),
            undo_stack: VecDeque::new(),
            redo_stack: Vec::new(),
            pending: None,
            modified: false,
        }
    }

    /// Create a buffer holding `text`, unmodified and with empty history
    pub fn from_text(text: &str) -> Self {
        let mut buffer = Self::new();
        buffer.rope = Rope::with_config(text, buffer.config.rope);
        buffer
    }

    pub fn id(&self) -> BufferId {
        self.id
    }

    pub fn config(&self) -> &BufferConfig {
        &self.config
    }

    /// Read-only snapshot of the current text
    ///
    /// The snapshot shares structure with the buffer and stays valid
    /// (and unchanged) across later edits.
    pub fn contents(&self) -> Rope {
        self.rope.clone()
    }

    pub fn text(&self) -> String {
        self.rope.to_text()
    }

    pub fn len(&self) -> usize {
        self.rope.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rope.is_empty()
    }

    pub fn line_count(&self) -> usize {
        self.rope.line_count()
    }

    pub fn cursor_position(&self) -> Offset {
        self.positions.cursor
    }

    /// `(line, column)` of the cursor
    pub fn cursor_coords(&self) -> Result<(LineNumber, usize)> {
        let line = self.rope.line_of_offset(self.positions.cursor)?;
        let start = self.rope.line_start_offset(line)?;
        Ok((line, self.positions.cursor - start))
    }

    pub fn selection_end(&self) -> Option<Offset> {
        self.positions.selection
    }

    /// Character at `(line, column)`, as the renderer samples the grid
    pub fn char_at_coord(&self, line: LineNumber, column: usize) -> Result<char> {
        let offset = self.rope.offset_of_coordinate(line, column)?;
        self.rope.char_at(offset)
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// Forget unsaved changes, e.g. after the text was written out
    pub fn clear_modified(&mut self) {
        self.modified = false;
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    // ------------------------------------------------------------------
    // Text edits
    // ------------------------------------------------------------------

    /// Insert at the cursor and advance the cursor past the new text
    pub fn insert(&mut self, text: &str) -> Result<()> {
        let pos = self.positions.cursor;
        self.insert_text(text, pos, true)
    }

    /// Insert at `pos`; the cursor does not move
    ///
    /// # Errors
    ///
    /// Returns `EditError::Position` if `pos > len`
    pub fn insert_at(&mut self, text: &str, pos: Offset) -> Result<()> {
        if pos > self.len() {
            return Err(position_error(pos, self.len()));
        }
        self.insert_text(text, pos, false)
    }

    fn insert_text(&mut self, text: &str, pos: Offset, move_cursor: bool) -> Result<()> {
        if text.is_empty() {
            return Ok(());
        }
        let inserted = Rope::with_config(text, self.config.rope);
        self.record(|buffer| {
            let len = inserted.len();
            buffer.raw_insert(pos, &inserted)?;
            buffer.positions.shift_insert(pos, len, move_cursor);
            Ok(((), UndoRecord::Insert { pos, len }))
        })
    }

    /// Type one character at the cursor
    ///
    /// Uses the rope's in-place append, so consecutive characters typed at
    /// the end of a leaf extend its storage instead of rebuilding nodes.
    pub fn insert_char(&mut self, ch: char) -> Result<()> {
        let pos = self.positions.cursor;
        self.record(|buffer| {
            buffer.rope.insert_char_in_place(ch, pos)?;
            buffer.positions.shift_insert(pos, 1, true);
            buffer.modified = true;
            Ok(((), UndoRecord::Insert { pos, len: 1 }))
        })
    }

    /// Delete `[start, end)` and return the removed text
    ///
    /// # Errors
    ///
    /// Returns `EditError::Range` if `start > end` or `end > len`
    pub fn delete_range(&mut self, start: Offset, end: Offset) -> Result<Rope> {
        if start == end && end <= self.len() {
            return Ok(Rope::with_config("", self.config.rope));
        }
        self.record(|buffer| {
            let cut = buffer.raw_delete(start, end)?;
            buffer.positions.shift_delete(start, end - start);
            Ok((
                cut.clone(),
                UndoRecord::Delete {
                    pos: start,
                    text: cut,
                },
            ))
        })
    }

    /// Delete `len` characters starting at the cursor
    pub fn delete(&mut self, len: usize) -> Result<Rope> {
        let start = self.positions.cursor;
        let end = start.checked_add(len).ok_or(EditError::Range {
            start,
            end: usize::MAX,
            length: self.len(),
        })?;
        self.delete_range(start, end)
    }

    /// Copy `[start, end)`; nothing is recorded
    pub fn copy_range(&self, start: Offset, end: Offset) -> Result<Rope> {
        self.rope.copy_range(start, end)
    }

    /// Copy `len` characters starting at the cursor
    pub fn copy(&self, len: usize) -> Result<Rope> {
        let start = self.positions.cursor;
        let end = start.checked_add(len).ok_or(EditError::Range {
            start,
            end: usize::MAX,
            length: self.len(),
        })?;
        self.copy_range(start, end)
    }

    /// Delete between the cursor and the selection end and return it
    ///
    /// The selection is cleared afterwards. Without a selection nothing
    /// happens and an empty rope is returned.
    pub fn cut(&mut self) -> Result<Rope> {
        let Some(selection) = self.positions.selection else {
            return Ok(Rope::with_config("", self.config.rope));
        };
        let cursor = self.positions.cursor;
        let (start, end) = (cursor.min(selection), cursor.max(selection));

        self.record(|buffer| {
            let cut = buffer.raw_delete(start, end)?;
            buffer.positions.shift_delete(start, end - start);
            buffer.positions.selection = None;
            Ok((
                cut.clone(),
                UndoRecord::Delete {
                    pos: start,
                    text: cut,
                },
            ))
        })
    }

    /// Replace the whole text, as after loading a file
    ///
    /// The cursor returns to 0, the selection is cleared and marks beyond
    /// the new end are pulled back to it. Undo restores the previous text
    /// and positions.
    pub fn load(&mut self, text: &str) -> Result<()> {
        let replacement = Rope::with_config(text, self.config.rope);
        tracing::debug!(buffer = %self.id, len = replacement.len(), "loading contents");
        self.record(|buffer| {
            let prior = buffer.raw_replace(replacement);
            buffer.positions.reset(buffer.rope.len());
            Ok(((), UndoRecord::Contents { prior }))
        })
    }

    // ------------------------------------------------------------------
    // Positions
    // ------------------------------------------------------------------

    /// Set or clear the selection end
    ///
    /// # Errors
    ///
    /// Returns `EditError::Position` if the offset is beyond the text
    pub fn set_selection_end(&mut self, selection: Option<Offset>) -> Result<()> {
        if let Some(offset) = selection {
            if offset > self.len() {
                return Err(position_error(offset, self.len()));
            }
        }
        self.record(|buffer| {
            buffer.positions.selection = selection;
            Ok(((), UndoRecord::Null))
        })
    }

    /// Create or move the mark `name` to `pos`
    ///
    /// # Errors
    ///
    /// Returns `EditError::Position` if `pos > len`
    pub fn set_mark_at(&mut self, name: &str, pos: Offset) -> Result<()> {
        if pos > self.len() {
            return Err(position_error(pos, self.len()));
        }
        self.record(|buffer| {
            buffer.positions.marks.insert(name.to_string(), pos);
            Ok(((), UndoRecord::Null))
        })
    }

    /// Create or move the mark `name` to the cursor
    pub fn set_mark(&mut self, name: &str) -> Result<()> {
        self.set_mark_at(name, self.positions.cursor)
    }

    /// Offset of the mark `name`
    ///
    /// # Errors
    ///
    /// Returns `EditError::NotFound` if no such mark is set
    pub fn get_mark(&self, name: &str) -> Result<Offset> {
        self.positions
            .marks
            .get(name)
            .copied()
            .ok_or_else(|| EditError::NotFound(Missing::Mark(name.to_string())))
    }

    /// Remove the mark `name`, returning where it was (0 if it was unset)
    pub fn remove_mark(&mut self, name: &str) -> Offset {
        let before = self.positions.clone();
        let removed = self.positions.marks.remove(name);
        let record = self.positions.restores(&before);
        self.push_undo(record);
        removed.unwrap_or(0)
    }

    /// Marks in name order
    pub fn marks(&self) -> impl Iterator<Item = (&str, Offset)> + '_ {
        self.positions
            .marks
            .iter()
            .map(|(name, &offset)| (name.as_str(), offset))
    }

    /// # Errors
    ///
    /// Returns `EditError::Position` if `pos > len`
    pub fn move_cursor_to(&mut self, pos: Offset) -> Result<()> {
        if pos > self.len() {
            return Err(position_error(pos, self.len()));
        }
        self.record(|buffer| {
            buffer.positions.cursor = pos;
            Ok(((), UndoRecord::Null))
        })
    }

    /// # Errors
    ///
    /// Returns `EditError::NotFound` if the coordinate has no offset
    pub fn move_cursor_to_coords(&mut self, line: LineNumber, column: usize) -> Result<()> {
        let pos = self.rope.offset_of_coordinate(line, column)?;
        self.move_cursor_to(pos)
    }

    /// # Errors
    ///
    /// Returns `EditError::NotFound` if no such mark is set
    pub fn move_cursor_to_mark(&mut self, name: &str) -> Result<()> {
        let pos = self.get_mark(name)?;
        self.move_cursor_to(pos)
    }

    /// # Errors
    ///
    /// Returns `EditError::Position` at the end of the text
    pub fn step_cursor_forward(&mut self) -> Result<()> {
        let cursor = self.positions.cursor;
        if cursor >= self.len() {
            return Err(position_error(cursor + 1, self.len()));
        }
        self.move_cursor_to(cursor + 1)
    }

    /// # Errors
    ///
    /// Returns `EditError::Position` at the start of the text
    pub fn step_cursor_backward(&mut self) -> Result<()> {
        let cursor = self.positions.cursor;
        if cursor == 0 {
            return Err(EditError::Position {
                position: None,
                length: self.len(),
            });
        }
        self.move_cursor_to(cursor - 1)
    }

    // ------------------------------------------------------------------
    // History
    // ------------------------------------------------------------------

    /// Run several operations as one undo step
    ///
    /// If `edits` fails, the buffer is put back exactly as it was before
    /// the group and the error is returned. Groups nest by joining the
    /// outermost one. Undo and redo are not available inside a group.
    ///
    /// ```rust
    /// use editkit_core::Buffer;
    ///
    /// let mut buffer = Buffer::from_text("fn main() {}");
    /// buffer
    ///     .group(|b| {
    ///         b.insert_at("pub ", 0)?;
    ///         b.insert_at(" ", 15)
    ///     })
    ///     .unwrap();
    /// assert_eq!(buffer.text(), "pub fn main() { }");
    ///
    /// buffer.undo().unwrap();
    /// assert_eq!(buffer.text(), "fn main() {}");
    /// ```
    pub fn group<T>(&mut self, edits: impl FnOnce(&mut Buffer) -> Result<T>) -> Result<T> {
        if self.pending.is_some() {
            return edits(self);
        }

        let saved_rope = self.rope.clone();
        let saved_positions = self.positions.clone();
        let saved_modified = self.modified;

        self.pending = Some(Vec::new());
        let result = edits(self);
        let records = self.pending.take().unwrap_or_default();

        match result {
            Ok(value) => {
                // Undo the latest edit first
                let record = records
                    .into_iter()
                    .rev()
                    .fold(UndoRecord::Null, UndoRecord::concat);
                self.push_undo(record);
                Ok(value)
            }
            Err(err) => {
                self.rope = saved_rope;
                self.positions = saved_positions;
                self.modified = saved_modified;
                Err(err)
            }
        }
    }

    /// Reverse the most recent undoable action
    ///
    /// Returns `false` if there was nothing to undo.
    ///
    /// # Errors
    ///
    /// Returns `EditError::UndoReplay` if the record no longer fits the
    /// text; the buffer and its history are left unchanged.
    pub fn undo(&mut self) -> Result<bool> {
        if self.pending.is_some() {
            return Ok(false);
        }
        let Some(record) = self.undo_stack.back().cloned() else {
            return Ok(false);
        };

        let inverse = self.replay(record)?;
        self.undo_stack.pop_back();
        if !inverse.is_null() {
            self.redo_stack.push(inverse);
        }
        tracing::debug!(
            buffer = %self.id,
            undo_depth = self.undo_stack.len(),
            redo_depth = self.redo_stack.len(),
            "undo"
        );
        Ok(true)
    }

    /// Reapply the most recently undone action
    ///
    /// Returns `false` if there was nothing to redo.
    pub fn redo(&mut self) -> Result<bool> {
        if self.pending.is_some() {
            return Ok(false);
        }
        let Some(record) = self.redo_stack.last().cloned() else {
            return Ok(false);
        };

        let inverse = self.replay(record)?;
        self.redo_stack.pop();
        self.push_history(inverse);
        tracing::debug!(
            buffer = %self.id,
            undo_depth = self.undo_stack.len(),
            redo_depth = self.redo_stack.len(),
            "redo"
        );
        Ok(true)
    }

    /// Execute `record` without recording it, returning the record that
    /// reverses the replay; on failure the buffer is restored
    fn replay(&mut self, record: UndoRecord) -> Result<UndoRecord> {
        let saved_rope = self.rope.clone();
        let saved_positions = self.positions.clone();
        let saved_modified = self.modified;

        match record.execute(self) {
            Ok(inverse) => Ok(inverse.concat(self.positions.restores(&saved_positions))),
            Err(err) => {
                tracing::error!(buffer = %self.id, error = %err, "undo record does not fit buffer");
                self.rope = saved_rope;
                self.positions = saved_positions;
                self.modified = saved_modified;
                Err(err)
            }
        }
    }

    /// Run `edit`, then record its inverse plus restores for every
    /// position it moved
    fn record<T>(
        &mut self,
        edit: impl FnOnce(&mut Buffer) -> Result<(T, UndoRecord)>,
    ) -> Result<T> {
        let before = self.positions.clone();
        let (value, inverse) = edit(self)?;
        let record = inverse.concat(self.positions.restores(&before));
        self.push_undo(record);
        Ok(value)
    }

    /// Record a new action; clears the redo stack
    fn push_undo(&mut self, record: UndoRecord) {
        if record.is_null() {
            return;
        }
        if let Some(pending) = self.pending.as_mut() {
            pending.push(record);
            return;
        }
        self.redo_stack.clear();
        self.push_history(record);
    }

    fn push_history(&mut self, record: UndoRecord) {
        if record.is_null() {
            return;
        }
        self.undo_stack.push_back(record);
        if let Some(limit) = self.config.undo_limit {
            while self.undo_stack.len() > limit {
                self.undo_stack.pop_front();
                tracing::trace!(buffer = %self.id, limit, "dropped oldest undo record");
            }
        }
    }

    // ------------------------------------------------------------------
    // Unrecorded text primitives shared by edits and replay
    //
    // These never move positions. Edits shift positions themselves, and
    // every record already carries absolute restores for the positions
    // its edit moved, so replay must leave the rest untouched.
    // ------------------------------------------------------------------

    fn raw_insert(&mut self, pos: Offset, text: &Rope) -> Result<()> {
        self.rope = self.rope.insert_rope(pos, text)?;
        self.modified = true;
        Ok(())
    }

    fn raw_delete(&mut self, start: Offset, end: Offset) -> Result<Rope> {
        let (cut, remainder) = self.rope.delete_range(start, end)?;
        self.rope = remainder;
        self.modified = true;
        Ok(cut)
    }

    fn raw_replace(&mut self, rope: Rope) -> Rope {
        let prior = std::mem::replace(&mut self.rope, rope);
        self.modified = true;
        prior
    }
}

impl Default for Buffer {
    fn default() -> Self {
        Self::new()
    }
}
