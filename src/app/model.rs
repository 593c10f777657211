use std::path::PathBuf;
use std::time::{Duration, Instant};

use crate::note::{NoteContent, NoteSurface, Variant};
use crate::pairing::ScanCapability;
use crate::relay::{DEFAULT_RELAY_URL, OutboundUpdate};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Warning,
    Error,
}

#[derive(Debug, Clone)]
struct Toast {
    level: ToastLevel,
    message: String,
    expires_at: Instant,
}

/// The complete application state.
///
/// Connection status, pairing and note content are owned here; nothing
/// lives in globals.
pub struct Model {
    /// Id the relay assigned to this connection
    pub session_id: Option<String>,
    pub connected: bool,
    /// The peer's session id, once known
    pub target: Option<String>,
    pub note: NoteSurface,
    pub capability: ScanCapability,
    /// Rendered QR rows for `session_id`
    pub pairing_code: Vec<String>,
    /// Relay address shown in help
    pub relay_url: String,
    /// Global config path shown in help
    pub config_global_path: Option<PathBuf>,
    /// Local override path shown in help
    pub config_local_path: Option<PathBuf>,
    /// Where the plain note is persisted, if anywhere
    pub store_path: Option<PathBuf>,
    pub help_visible: bool,
    pub should_quit: bool,
    /// Line index of the first visible note line
    pub editor_scroll_offset: usize,
    pub terminal_size: (u16, u16),
    pending_update: Option<OutboundUpdate>,
    persist_pending: bool,
    toast: Option<Toast>,
}

impl std::fmt::Debug for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Model")
            .field("session_id", &self.session_id)
            .field("connected", &self.connected)
            .field("target", &self.target)
            .field("variant", &self.note.variant())
            .field("capability", &self.capability)
            .finish_non_exhaustive()
    }
}

impl Default for Model {
    fn default() -> Self {
        Self::new(
            NoteContent::empty(Variant::Rich),
            ScanCapability::Unsupported,
            (80, 24),
        )
    }
}

impl Model {
    pub fn new(
        content: NoteContent,
        capability: ScanCapability,
        terminal_size: (u16, u16),
    ) -> Self {
        Self {
            session_id: None,
            connected: false,
            target: None,
            note: NoteSurface::new(content),
            capability,
            pairing_code: Vec::new(),
            relay_url: DEFAULT_RELAY_URL.to_string(),
            config_global_path: None,
            config_local_path: None,
            store_path: None,
            help_visible: false,
            should_quit: false,
            editor_scroll_offset: 0,
            terminal_size,
            pending_update: None,
            persist_pending: false,
            toast: None,
        }
    }

    /// Edits are accepted only while connected to a known peer.
    pub const fn can_edit(&self) -> bool {
        self.connected && self.target.is_some()
    }

    /// The scanner region stays up until a peer is known.
    pub const fn scanner_visible(&self) -> bool {
        self.target.is_none()
    }

    /// Whether a QR code can be shown for this connection.
    pub const fn pairing_ready(&self) -> bool {
        self.connected && self.session_id.is_some() && !self.pairing_code.is_empty()
    }

    /// Queue the current content for the peer. Does nothing unless both
    /// connected and paired.
    pub(super) fn queue_update(&mut self) {
        if !self.connected {
            return;
        }
        if let Some(target) = &self.target {
            self.pending_update = Some(OutboundUpdate::new(target.clone(), self.note.to_wire()));
        }
    }

    pub(super) fn take_pending_update(&mut self) -> Option<OutboundUpdate> {
        self.pending_update.take()
    }

    /// Ask for the plain note to be written to the store.
    pub(super) const fn request_persist(&mut self) {
        if matches!(self.note.variant(), Variant::Plain) {
            self.persist_pending = true;
        }
    }

    pub(super) const fn take_persist_request(&mut self) -> bool {
        std::mem::replace(&mut self.persist_pending, false)
    }

    /// Rows available to the note body.
    pub fn note_rows(&self) -> usize {
        usize::from(crate::ui::note_area_height(self))
    }

    pub(super) fn show_toast(&mut self, level: ToastLevel, message: impl Into<String>) {
        self.toast = Some(Toast {
            level,
            message: message.into(),
            expires_at: Instant::now() + Duration::from_secs(4),
        });
    }

    pub(super) fn expire_toast(&mut self, now: Instant) -> bool {
        if self
            .toast
            .as_ref()
            .is_some_and(|toast| toast.expires_at <= now)
        {
            self.toast = None;
            return true;
        }
        false
    }

    pub fn active_toast(&self) -> Option<(&str, ToastLevel)> {
        self.toast
            .as_ref()
            .map(|toast| (toast.message.as_str(), toast.level))
    }
}
