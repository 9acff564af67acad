//! Cursor, selection and named marks, and how edits move them

use super::undo::UndoRecord;
use crate::Offset;
use std::collections::BTreeMap;

/// New position of `mark` after inserting `len` characters at `pos`
pub(crate) fn shift_for_insert(mark: Offset, pos: Offset, len: usize) -> Offset {
    if mark >= pos {
        mark + len
    } else {
        mark
    }
}

/// New position of `mark` after deleting `[start, start + len)`
///
/// Marks inside the range collapse to `start`.
pub(crate) fn shift_for_delete(mark: Offset, start: Offset, len: usize) -> Offset {
    if mark >= start + len {
        mark - len
    } else if mark > start {
        start
    } else {
        mark
    }
}

/// Every tracked offset in a buffer
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Positions {
    pub(crate) cursor: Offset,
    pub(crate) selection: Option<Offset>,
    pub(crate) marks: BTreeMap<String, Offset>,
}

impl Positions {
    /// Apply the insertion rule to the selection and marks; the cursor
    /// follows the same rule only when `move_cursor` is set
    pub(crate) fn shift_insert(&mut self, pos: Offset, len: usize, move_cursor: bool) {
        if move_cursor {
            self.cursor = shift_for_insert(self.cursor, pos, len);
        }
        if let Some(selection) = self.selection.as_mut() {
            *selection = shift_for_insert(*selection, pos, len);
        }
        for mark in self.marks.values_mut() {
            *mark = shift_for_insert(*mark, pos, len);
        }
    }

    pub(crate) fn shift_delete(&mut self, start: Offset, len: usize) {
        self.cursor = shift_for_delete(self.cursor, start, len);
        if let Some(selection) = self.selection.as_mut() {
            *selection = shift_for_delete(*selection, start, len);
        }
        for mark in self.marks.values_mut() {
            *mark = shift_for_delete(*mark, start, len);
        }
    }

    /// State after wholesale replacement of the text: cursor home,
    /// selection dropped, marks pulled inside the new length
    pub(crate) fn reset(&mut self, len: usize) {
        self.cursor = 0;
        self.selection = None;
        for mark in self.marks.values_mut() {
            *mark = (*mark).min(len);
        }
    }

    /// Records that take these positions back to `before`
    pub(crate) fn restores(&self, before: &Positions) -> UndoRecord {
        let mut record = UndoRecord::Null;

        if self.cursor != before.cursor {
            record = record.concat(UndoRecord::CursorMove {
                prior: before.cursor,
            });
        }
        if self.selection != before.selection {
            record = record.concat(UndoRecord::Selection {
                prior: before.selection,
            });
        }

        for (name, &prior) in &before.marks {
            if self.marks.get(name) != Some(&prior) {
                record = record.concat(UndoRecord::Mark {
                    name: name.clone(),
                    prior: Some(prior),
                });
            }
        }
        for name in self.marks.keys() {
            if !before.marks.contains_key(name) {
                record = record.concat(UndoRecord::Mark {
                    name: name.clone(),
                    prior: None,
                });
            }
        }

        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_rule() {
        assert_eq!(shift_for_insert(8, 17, 9), 8);
        assert_eq!(shift_for_insert(17, 17, 9), 26);
        assert_eq!(shift_for_insert(28, 17, 9), 37);
    }

    #[test]
    fn test_delete_rule() {
        // Before the range
        assert_eq!(shift_for_delete(3, 5, 4), 3);
        // At the start and inside collapse to start
        assert_eq!(shift_for_delete(5, 5, 4), 5);
        assert_eq!(shift_for_delete(7, 5, 4), 5);
        // At the end and after shift back
        assert_eq!(shift_for_delete(9, 5, 4), 5);
        assert_eq!(shift_for_delete(20, 5, 4), 16);
    }

    #[test]
    fn test_insert_leaves_cursor_unless_asked() {
        let mut positions = Positions {
            cursor: 10,
            ..Positions::default()
        };
        positions.shift_insert(2, 3, false);
        assert_eq!(positions.cursor, 10);
        positions.shift_insert(2, 3, true);
        assert_eq!(positions.cursor, 13);
    }

    #[test]
    fn test_restores_diff() {
        let mut before = Positions::default();
        before.marks.insert("a".to_string(), 4);
        before.marks.insert("gone".to_string(), 1);

        let mut after = before.clone();
        after.cursor = 6;
        after.marks.insert("a".to_string(), 9);
        after.marks.remove("gone");
        after.marks.insert("new".to_string(), 2);

        let record = after.restores(&before);
        assert_eq!(
            record,
            UndoRecord::Compound(vec![
                UndoRecord::CursorMove { prior: 0 },
                UndoRecord::Mark {
                    name: "a".to_string(),
                    prior: Some(4),
                },
                UndoRecord::Mark {
                    name: "gone".to_string(),
                    prior: Some(1),
                },
                UndoRecord::Mark {
                    name: "new".to_string(),
                    prior: None,
                },
            ])
        );

        assert_eq!(before.restores(&before), UndoRecord::Null);
    }

    #[test]
    fn test_reset_clamps_marks() {
        let mut positions = Positions {
            cursor: 12,
            selection: Some(3),
            ..Positions::default()
        };
        positions.marks.insert("far".to_string(), 40);
        positions.marks.insert("near".to_string(), 2);

        positions.reset(10);
        assert_eq!(positions.cursor, 0);
        assert_eq!(positions.selection, None);
        assert_eq!(positions.marks["far"], 10);
        assert_eq!(positions.marks["near"], 2);
    }
}
