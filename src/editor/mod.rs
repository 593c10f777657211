//! Rope-backed text buffer for the note surface.
//!
//! Every mutation reports an [`Edit`] in char coordinates so that rich-text
//! block metadata can follow the text.

mod buffer;

pub use buffer::{Cursor, Direction, Edit, EditorBuffer, is_line_break};
