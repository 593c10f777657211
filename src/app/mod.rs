//! Application state and main event loop.
//!
//! This module implements The Elm Architecture (TEA):
//! - [`Model`]: The complete application state
//! - [`Message`]: All possible events and actions
//! - [`update`]: Pure function for state transitions
//! - [`App::run`]: Main event loop with rendering

mod effects;
mod event_loop;
mod input;
mod model;
mod update;

pub use model::{Model, ToastLevel};
pub use update::{Message, update};

use std::path::PathBuf;

use crate::note::{NoteStore, Variant};
use crate::pairing::DeviceClass;
use crate::relay::RelayConfig;

/// Main application struct that owns the configuration and runs the event loop.
pub struct App {
    relay: RelayConfig,
    variant: Variant,
    device: DeviceClass,
    camera: Option<PathBuf>,
    store: Option<NoteStore>,
    config_global_path: Option<PathBuf>,
    config_local_path: Option<PathBuf>,
}

impl App {
    /// Create a new application talking to `relay`.
    pub const fn new(relay: RelayConfig) -> Self {
        Self {
            relay,
            variant: Variant::Rich,
            device: DeviceClass::Desktop,
            camera: None,
            store: None,
            config_global_path: None,
            config_local_path: None,
        }
    }

    /// Choose the note representation.
    #[must_use]
    pub const fn with_variant(mut self, variant: Variant) -> Self {
        self.variant = variant;
        self
    }

    /// Set the form factor and, for handheld devices, the camera frame file.
    #[must_use]
    pub fn with_device(mut self, device: DeviceClass, camera: Option<PathBuf>) -> Self {
        self.device = device;
        self.camera = camera;
        self
    }

    /// Persist the plain note here. Ignored for rich notes.
    #[must_use]
    pub fn with_store(mut self, store: Option<NoteStore>) -> Self {
        self.store = store;
        self
    }

    /// Set config paths to show in help.
    #[must_use]
    pub fn with_config_paths(
        mut self,
        global_path: Option<PathBuf>,
        local_path: Option<PathBuf>,
    ) -> Self {
        self.config_global_path = global_path;
        self.config_local_path = local_path;
        self
    }
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("relay", &self.relay.url.as_str())
            .field("variant", &self.variant)
            .field("device", &self.device)
            .finish_non_exhaustive()
    }
}
