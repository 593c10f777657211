// Only allow lints that are either transitive-dependency noise or
// genuinely opinionated style choices that don't indicate real issues.
#![allow(
    // Transitive dependency version mismatches we can't control
    clippy::multiple_crate_versions,
    // module_name_repetitions is pure style preference (e.g. relay::RelayClient)
    clippy::module_name_repetitions
)]

//! # Notemirror
//!
//! Mirror a note between two terminals over a realtime relay.
//!
//! Each instance connects to a Socket.IO relay and shows its session id as
//! a QR code. The other side scans it (or is scanned), and from then on
//! every edit sends the whole note to the peer:
//! - Plain or rich (block-structured) notes
//! - QR pairing, with a camera-frame scanner on handheld devices
//! - Last write wins, no merging
//!
//! ## Architecture
//!
//! Notemirror uses The Elm Architecture (TEA) pattern:
//! - **Model**: Application state
//! - **Message**: Events and actions
//! - **Update**: Pure state transitions
//! - **View**: Render to terminal
//!
//! ## Modules
//!
//! - [`app`]: Main application loop and state
//! - [`note`]: Note content, raw rich-text conversion and persistence
//! - [`editor`]: Text buffer and cursor movement
//! - [`relay`]: Socket.IO relay client
//! - [`pairing`]: QR rendering, scanning and device capability
//! - [`ui`]: Terminal UI components
//! - [`watcher`]: Camera frame watching
//! - [`config`]: Layered flag files

pub mod app;
pub mod config;
pub mod editor;
pub mod note;
pub mod pairing;
pub mod perf;
pub mod relay;
pub mod ui;
pub mod watcher;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::app::{App, Message, Model};
    pub use crate::note::{NoteContent, Variant};
    pub use crate::relay::{RelayConfig, RelayLink};
}
