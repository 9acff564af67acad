//! EditKit Core - persistent text storage for editors
//!
//! This crate is the storage layer underneath a text editor. It
//! implements:
//! - A persistent rope with structural sharing and bounded depth
//! - Line/offset addressing over per-node newline counts
//! - An editing session with cursor, selection and named marks
//! - Reversible undo records with redo and grouped edits
//!
//! # Examples
//!
//! ```rust
//! use editkit_core::Buffer;
//!
//! let mut buffer = Buffer::new();
//! buffer.insert("Hello World\n").unwrap();
//! buffer.set_mark_at("world", 6).unwrap();
//! buffer.insert_at("there ", 6).unwrap();
//!
//! assert_eq!(buffer.text(), "Hello there World\n");
//! assert_eq!(buffer.get_mark("world").unwrap(), 12);
//! assert_eq!(buffer.contents().line_start_offset(1).unwrap(), 18);
//! ```

pub mod buffer;
pub mod config;
pub mod error;
pub mod rope;

// Re-exports for convenience
pub use buffer::{Buffer, BufferId, UndoRecord};
pub use config::{BufferConfig, RopeConfig};
pub use error::{EditError, Missing, Result};
pub use rope::{Chunks, Rope};

/// Character offset into a rope or buffer
pub type Offset = usize;

/// Zero-based line number
pub type LineNumber = usize;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_session() {
        let mut buffer = Buffer::from_text("fn main() {}\n");
        let snapshot = buffer.contents();

        buffer.move_cursor_to(11).unwrap();
        buffer.insert("\n    println!();\n").unwrap();
        assert_eq!(buffer.line_count(), 4);
        assert_eq!(snapshot.to_text(), "fn main() {}\n");

        buffer.undo().unwrap();
        assert_eq!(buffer.contents(), snapshot);
    }
}
