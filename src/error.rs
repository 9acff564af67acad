//! Error types for rope and buffer operations
//!
//! Every fallible operation in this crate returns [`Result`]. Failures are
//! reported before any state is touched, so a rejected edit leaves the
//! rope or buffer exactly as it was.

use thiserror::Error;

/// What a [`EditError::NotFound`] failed to locate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Missing {
    /// No mark with this name is set
    Mark(String),

    /// The line has no defined start (or, for length queries, no
    /// following line start)
    Line(usize),

    /// The column lies at or beyond the end of the line
    Column { line: usize, column: usize },
}

impl std::fmt::Display for Missing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Missing::Mark(name) => write!(f, "mark '{}'", name),
            Missing::Line(line) => write!(f, "line {}", line),
            Missing::Column { line, column } => write!(f, "column {} on line {}", column, line),
        }
    }
}

/// Error kinds for rope and buffer operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EditError {
    /// Offset outside `[0, length]` (or `[0, length)` for character reads)
    #[error("Index {index} out of bounds (length: {length})")]
    Index { index: usize, length: usize },

    /// Range reversed or either bound outside the text
    #[error("Range {start}..{end} out of bounds (length: {length})")]
    Range {
        start: usize,
        end: usize,
        length: usize,
    },

    /// Cursor move target invalid; `None` is a step back from offset 0
    #[error("Cursor position {} invalid (length: {length})", describe_position(.position))]
    Position {
        position: Option<usize>,
        length: usize,
    },

    /// Mark name unknown, or line/column has no defined offset
    #[error("Not found: {0}")]
    NotFound(Missing),

    /// An undo record's preconditions did not hold during replay
    #[error("Undo replay failed: {0}")]
    UndoReplay(String),

    /// Configuration rejected
    #[error("Invalid configuration: {0}")]
    Config(String),
}

fn describe_position(position: &Option<usize>) -> String {
    match position {
        Some(offset) => offset.to_string(),
        None => "-1".to_string(),
    }
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, EditError>;
