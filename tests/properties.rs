//! Property tests for rope editing and buffer history

use editkit_core::{Buffer, BufferConfig, Rope, RopeConfig};
use proptest::prelude::*;

/// Small leaves and a low depth threshold so short inputs still build
/// deep, many-leaf trees
fn tight() -> RopeConfig {
    RopeConfig {
        balance_factor: 2,
        fusion_threshold: 2,
        depth_threshold: 4,
        node_size: 4,
    }
}

fn char_slice(s: &str, start: usize, end: usize) -> String {
    s.chars().skip(start).take(end - start).collect()
}

const MARKS: [&str; 3] = ["a", "b", "c"];

#[derive(Debug, Clone)]
enum Edit {
    Insert(usize, String),
    Type(char),
    Delete(usize, usize),
    Cut,
    Mark(usize, usize),
    Unmark(usize),
    Select(Option<usize>),
    Move(usize),
}

fn edit() -> impl Strategy<Value = Edit> {
    prop_oneof![
        (any::<usize>(), "[a-z\n]{1,6}").prop_map(|(at, text)| Edit::Insert(at, text)),
        proptest::char::range('a', 'z').prop_map(Edit::Type),
        (any::<usize>(), 0usize..6).prop_map(|(at, len)| Edit::Delete(at, len)),
        Just(Edit::Cut),
        (0usize..MARKS.len(), any::<usize>()).prop_map(|(mark, at)| Edit::Mark(mark, at)),
        (0usize..MARKS.len()).prop_map(Edit::Unmark),
        proptest::option::of(any::<usize>()).prop_map(Edit::Select),
        any::<usize>().prop_map(Edit::Move),
    ]
}

fn apply(buffer: &mut Buffer, edit: &Edit) {
    let len = buffer.len();
    match edit {
        Edit::Insert(at, text) => buffer.insert_at(text, at % (len + 1)).unwrap(),
        Edit::Type(ch) => buffer.insert_char(*ch).unwrap(),
        Edit::Delete(at, count) => {
            let start = at % (len + 1);
            let end = (start + count).min(len);
            buffer.delete_range(start, end).unwrap();
        }
        Edit::Cut => {
            buffer.cut().unwrap();
        }
        Edit::Mark(mark, at) => buffer.set_mark_at(MARKS[*mark], at % (len + 1)).unwrap(),
        Edit::Unmark(mark) => {
            buffer.remove_mark(MARKS[*mark]);
        }
        Edit::Select(at) => buffer
            .set_selection_end(at.map(|at| at % (len + 1)))
            .unwrap(),
        Edit::Move(at) => buffer.move_cursor_to(at % (len + 1)).unwrap(),
    }
}

/// Text and every tracked position
#[derive(Debug, Clone, PartialEq, Eq)]
struct State {
    text: String,
    cursor: usize,
    selection: Option<usize>,
    marks: Vec<(String, usize)>,
}

fn state(buffer: &Buffer) -> State {
    State {
        text: buffer.text(),
        cursor: buffer.cursor_position(),
        selection: buffer.selection_end(),
        marks: buffer
            .marks()
            .map(|(name, offset)| (name.to_string(), offset))
            .collect(),
    }
}

proptest! {
    #[test]
    fn create_preserves_content(s in "\\PC{0,200}") {
        let rope = Rope::with_config(&s, tight());
        prop_assert_eq!(rope.to_text(), s.clone());
        prop_assert_eq!(rope.len(), s.chars().count());
        prop_assert_eq!(rope.newline_count(), s.matches('\n').count());
    }

    #[test]
    fn split_then_concat_restores(s in "\\PC{0,120}", idx in 0usize..130) {
        let rope = Rope::with_config(&s, tight());
        let idx = idx.min(rope.len());
        let (left, right) = rope.split(idx).unwrap();

        prop_assert_eq!(left.len(), idx);
        prop_assert_eq!(left.to_text(), char_slice(&s, 0, idx));
        prop_assert_eq!(left.concat(&right).to_text(), s);
    }

    #[test]
    fn insert_then_delete_is_identity(
        s in "\\PC{0,80}",
        insert in "\\PC{0,20}",
        idx in 0usize..100,
    ) {
        let rope = Rope::with_config(&s, tight());
        let pos = idx.min(rope.len());
        let inserted_len = insert.chars().count();

        let edited = rope.insert_at(pos, &insert).unwrap();
        let (cut, restored) = edited.delete_range(pos, pos + inserted_len).unwrap();

        prop_assert_eq!(cut.to_text(), insert);
        prop_assert_eq!(restored, rope);
    }

    #[test]
    fn char_at_matches_text(s in "\\PC{1,80}", idx in 0usize..80) {
        let rope = Rope::with_config(&s, tight());
        let idx = idx % rope.len();
        prop_assert_eq!(rope.char_at(idx).unwrap(), s.chars().nth(idx).unwrap());
    }

    #[test]
    fn line_starts_follow_newlines(s in "[ab\n]{0,80}") {
        let rope = Rope::with_config(&s, tight());
        let mut expected = vec![0];
        expected.extend(
            s.chars()
                .enumerate()
                .filter(|&(_, ch)| ch == '\n')
                .map(|(pos, _)| pos + 1),
        );

        for (line, &start) in expected.iter().enumerate() {
            prop_assert_eq!(rope.line_start_offset(line).unwrap(), start);
            prop_assert_eq!(rope.line_of_offset(start).unwrap(), line);
        }
        prop_assert!(rope.line_start_offset(expected.len()).is_err());
    }

    #[test]
    fn depth_stays_bounded(inserts in prop::collection::vec((any::<usize>(), "[a-z]{1,5}"), 1..60)) {
        let config = tight();
        let mut rope = Rope::with_config("", config);
        for (at, text) in &inserts {
            let pos = at % (rope.len() + 1);
            rope = rope.insert_at(pos, text).unwrap();
            prop_assert!(rope.depth() <= config.depth_threshold || rope.is_balanced());
        }
    }

    #[test]
    fn typing_in_place_matches_plain_insert(s in "[a-z]{0,20}", typed in "[a-z\n]{1,30}") {
        let mut fast = Rope::with_config(&s, tight());
        let snapshot = fast.clone();
        let mut slow = fast.clone();

        for (i, ch) in typed.chars().enumerate() {
            let pos = s.chars().count() + i;
            fast.insert_char_in_place(ch, pos).unwrap();
            slow = slow.insert_char(pos, ch).unwrap();
        }

        prop_assert_eq!(&fast, &slow);
        prop_assert_eq!(snapshot.to_text(), s);
    }

    #[test]
    fn marks_follow_edits(
        s in "[a-z]{10,40}",
        mark in 0usize..40,
        pos in 0usize..40,
        insert in "[A-Z]{1,8}",
    ) {
        let mut buffer = Buffer::from_text(&s);
        let mark = mark.min(buffer.len());
        let pos = pos.min(buffer.len());
        let len = insert.chars().count();
        buffer.set_mark_at("m", mark).unwrap();

        buffer.insert_at(&insert, pos).unwrap();
        let expected = if mark >= pos { mark + len } else { mark };
        prop_assert_eq!(buffer.get_mark("m").unwrap(), expected);

        buffer.delete_range(pos, pos + len).unwrap();
        prop_assert_eq!(buffer.get_mark("m").unwrap(), mark);
    }

    #[test]
    fn undo_and_redo_restore_every_position(
        s in "[a-z\n]{0,30}",
        setup in prop::collection::vec(any::<usize>(), 5),
        edits in prop::collection::vec(edit(), 1..25),
    ) {
        let mut buffer = Buffer::with_config(BufferConfig {
            rope: tight(),
            undo_limit: None,
        });
        buffer.load(&s).unwrap();
        let len = buffer.len();
        for (name, at) in MARKS.iter().zip(&setup) {
            buffer.set_mark_at(name, at % (len + 1)).unwrap();
        }
        buffer.set_selection_end(Some(setup[3] % (len + 1))).unwrap();
        buffer.move_cursor_to(setup[4] % (len + 1)).unwrap();
        let base_depth = buffer.undo_depth();

        // Initial state, then the state after each recorded step
        let mut history = vec![state(&buffer)];
        for edit in &edits {
            let depth = buffer.undo_depth();
            apply(&mut buffer, edit);
            if buffer.undo_depth() > depth {
                history.push(state(&buffer));
            }
        }
        prop_assert_eq!(buffer.undo_depth() - base_depth, history.len() - 1);

        for expected in history.iter().rev().skip(1) {
            prop_assert!(buffer.undo().unwrap());
            prop_assert_eq!(&state(&buffer), expected);
        }
        prop_assert_eq!(buffer.undo_depth(), base_depth);

        for expected in history.iter().skip(1) {
            prop_assert!(buffer.redo().unwrap());
            prop_assert_eq!(&state(&buffer), expected);
        }
        prop_assert!(!buffer.can_redo());
    }
}
