//! Note content and the surface that edits it.
//!
//! - [`content`]: plain and rich representations and their wire form
//! - [`rich`]: the block/inline-style document model
//! - [`raw`]: Draft-style raw content used on the wire
//! - [`surface`]: editing operations that keep blocks aligned with the text
//! - [`store`]: on-device persistence for the plain variant

pub mod content;
pub mod raw;
pub mod rich;
pub mod store;
pub mod surface;

pub use content::{ContentError, NoteContent, Variant};
pub use rich::{BlockType, InlineStyle, RichDocument};
pub use store::{NoteStore, default_store_path};
pub use surface::NoteSurface;
