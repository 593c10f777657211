//! Terminal UI components.
//!
//! - [`render`]: screen layout, pairing panel, scanner region and note body
//! - [`style`]: block and inline styling

pub mod style;

mod overlays;
mod render;
mod status;

pub use render::{
    NOTE_PLACEHOLDER, PAIRING_HEADING, PAIRING_PLACEHOLDER, Sections, TARGET_LABEL,
    layout_sections, note_area_height, render,
};

#[cfg(test)]
mod tests;
