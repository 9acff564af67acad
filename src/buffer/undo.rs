//! Undo records: reversible descriptions of buffer edits
//!
//! A record describes how to get *back* to an earlier state. Executing an
//! `Insert` record deletes, executing a `Delete` record re-inserts the
//! stored text verbatim, and the position records put the cursor,
//! selection or a mark back where it was.
//!
//! # Composition
//!
//! [`UndoRecord::concat`] joins records into a `Compound` executed in
//! stored order. `Null` is the identity and compounds are flattened, so
//! composition never builds nested trees:
//!
//! ```rust
//! use editkit_core::UndoRecord;
//!
//! let a = UndoRecord::CursorMove { prior: 3 };
//! assert_eq!(a.clone().concat(UndoRecord::Null), a);
//!
//! let joined = UndoRecord::Compound(vec![a.clone()])
//!     .concat(UndoRecord::Compound(vec![UndoRecord::Insert { pos: 0, len: 2 }]));
//! assert_eq!(
//!     joined,
//!     UndoRecord::Compound(vec![a, UndoRecord::Insert { pos: 0, len: 2 }])
//! );
//! ```

use super::Buffer;
use crate::error::{EditError, Result};
use crate::rope::Rope;
use crate::Offset;

/// How to reverse one edit, or an ordered group of them
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UndoRecord {
    /// Nothing to reverse
    Null,

    /// Put the cursor back at `prior`
    CursorMove { prior: Offset },

    /// `len` characters were inserted at `pos`; undo deletes them
    Insert { pos: Offset, len: usize },

    /// `text` was deleted at `pos`; undo re-inserts it
    Delete { pos: Offset, text: Rope },

    /// Restore a mark (`None`: the mark did not exist)
    Mark { name: String, prior: Option<Offset> },

    /// Restore the selection end
    Selection { prior: Option<Offset> },

    /// The whole text was replaced; undo swaps `prior` back in
    Contents { prior: Rope },

    /// Records executed in stored order
    Compound(Vec<UndoRecord>),
}

impl UndoRecord {
    pub fn is_null(&self) -> bool {
        matches!(self, UndoRecord::Null)
    }

    /// Join two records, `self` executing first
    pub fn concat(self, other: UndoRecord) -> UndoRecord {
        match (self, other) {
            (UndoRecord::Null, record) | (record, UndoRecord::Null) => record,
            (UndoRecord::Compound(mut first), UndoRecord::Compound(second)) => {
                first.extend(second);
                UndoRecord::Compound(first)
            }
            (UndoRecord::Compound(mut first), record) => {
                first.push(record);
                UndoRecord::Compound(first)
            }
            (record, UndoRecord::Compound(mut second)) => {
                second.insert(0, record);
                UndoRecord::Compound(second)
            }
            (first, second) => UndoRecord::Compound(vec![first, second]),
        }
    }

    /// Apply this record to `buffer` without recording history
    ///
    /// Text records change only the text; cursor, selection and marks move
    /// solely through the position records. Returns the record reversing
    /// the *text* changes just made, in the order that undoes them;
    /// position restores are left to the caller, which diffs positions
    /// around the whole replay.
    ///
    /// # Errors
    ///
    /// Returns `EditError::UndoReplay` if the buffer no longer matches the
    /// record (offsets beyond the current text). Earlier sub-records of a
    /// compound may already have been applied; callers roll back.
    pub(crate) fn execute(self, buffer: &mut Buffer) -> Result<UndoRecord> {
        match self {
            UndoRecord::Null => Ok(UndoRecord::Null),
            UndoRecord::CursorMove { prior } => {
                check_offset(buffer, prior, "cursor")?;
                buffer.positions.cursor = prior;
                Ok(UndoRecord::Null)
            }
            UndoRecord::Insert { pos, len } => {
                let end = pos
                    .checked_add(len)
                    .filter(|&end| end <= buffer.len())
                    .ok_or_else(|| {
                        EditError::UndoReplay(format!(
                            "inserted span {}+{} exceeds text length {}",
                            pos,
                            len,
                            buffer.len()
                        ))
                    })?;
                let text = buffer.raw_delete(pos, end)?;
                Ok(UndoRecord::Delete { pos, text })
            }
            UndoRecord::Delete { pos, text } => {
                check_offset(buffer, pos, "deleted text")?;
                let len = text.len();
                buffer.raw_insert(pos, &text)?;
                Ok(UndoRecord::Insert { pos, len })
            }
            UndoRecord::Mark { name, prior } => {
                match prior {
                    Some(offset) => {
                        check_offset(buffer, offset, "mark")?;
                        buffer.positions.marks.insert(name, offset);
                    }
                    None => {
                        buffer.positions.marks.remove(&name);
                    }
                }
                Ok(UndoRecord::Null)
            }
            UndoRecord::Selection { prior } => {
                if let Some(offset) = prior {
                    check_offset(buffer, offset, "selection")?;
                }
                buffer.positions.selection = prior;
                Ok(UndoRecord::Null)
            }
            UndoRecord::Contents { prior } => {
                let current = buffer.raw_replace(prior);
                Ok(UndoRecord::Contents { prior: current })
            }
            UndoRecord::Compound(records) => {
                let mut inverses = Vec::with_capacity(records.len());
                for record in records {
                    inverses.push(record.execute(buffer)?);
                }
                Ok(inverses
                    .into_iter()
                    .rev()
                    .fold(UndoRecord::Null, UndoRecord::concat))
            }
        }
    }
}

fn check_offset(buffer: &Buffer, offset: Offset, what: &str) -> Result<()> {
    if offset > buffer.len() {
        return Err(EditError::UndoReplay(format!(
            "{} offset {} exceeds text length {}",
            what,
            offset,
            buffer.len()
        )));
    }
    Ok(())
}
