use serde_json::Value;

use crate::app::{Model, ToastLevel};
use crate::editor::Direction;
use crate::note::{InlineStyle, NoteContent};
use crate::pairing::qr_rows;
use crate::relay::RelayEvent;

/// All possible events and actions in the application.
///
/// These represent user input, relay traffic, scanner results and window
/// events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    // Relay
    /// Connected; the relay assigned this session id
    RelayConnected(String),
    /// Connection dropped
    RelayDisconnected(String),
    /// A connection attempt failed
    RelayUnreachable(String),
    /// The relay delivered something that is not an update
    RelayRejected(String),
    /// The peer sent its full note state
    RemoteUpdate { from: String, data: Value },

    // Pairing
    /// The scanner read a code
    ScanDecoded(String),
    /// Forget the peer and scan again
    Rescan,

    // Editor
    /// Insert a character at the cursor
    InsertChar(char),
    /// Insert pasted text at the cursor
    InsertText(String),
    /// Delete character before cursor (Backspace)
    DeleteBack,
    /// Delete character at cursor (Delete)
    DeleteForward,
    /// Split line at cursor (Enter)
    SplitLine,
    /// Move cursor in a direction
    MoveCursor(Direction),
    /// Move cursor to beginning of line (Home)
    MoveHome,
    /// Move cursor to end of line (End)
    MoveEnd,
    /// Move cursor one word left (Ctrl+Left)
    MoveWordLeft,
    /// Move cursor one word right (Ctrl+Right)
    MoveWordRight,
    /// Move cursor to start of note (Ctrl+Home)
    MoveToStart,
    /// Move cursor to end of note (Ctrl+End)
    MoveToEnd,
    /// Toggle an inline style on the current block
    ToggleStyle(InlineStyle),
    /// Cycle the current block's type
    CycleBlockType,
    /// Scroll the note up by n lines
    ScrollUp(usize),
    /// Scroll the note down by n lines
    ScrollDown(usize),

    /// Toggle help overlay
    ToggleHelp,
    /// Hide help overlay
    HideHelp,

    // Window
    /// Terminal resized
    Resize(u16, u16),
    /// Redraw screen
    Redraw,

    // Application
    /// Quit the application
    Quit,
}

impl From<RelayEvent> for Message {
    fn from(event: RelayEvent) -> Self {
        match event {
            RelayEvent::Connected { session_id } => Self::RelayConnected(session_id),
            RelayEvent::Disconnected { reason } => Self::RelayDisconnected(reason),
            RelayEvent::Update(update) => Self::RemoteUpdate {
                from: update.from,
                data: update.data,
            },
            RelayEvent::Unreachable(reason) => Self::RelayUnreachable(reason),
            RelayEvent::Rejected(reason) => Self::RelayRejected(reason),
        }
    }
}

impl Message {
    /// Messages that change or move within the note.
    pub const fn is_edit(&self) -> bool {
        matches!(
            self,
            Self::InsertChar(_)
                | Self::InsertText(_)
                | Self::DeleteBack
                | Self::DeleteForward
                | Self::SplitLine
                | Self::MoveCursor(_)
                | Self::MoveHome
                | Self::MoveEnd
                | Self::MoveWordLeft
                | Self::MoveWordRight
                | Self::MoveToStart
                | Self::MoveToEnd
                | Self::ToggleStyle(_)
                | Self::CycleBlockType
        )
    }
}

/// Pure function that updates the model based on a message.
///
/// This is the core of TEA - all state transitions happen here. Outbound
/// updates and persistence are only queued; effects drain them.
pub fn update(mut model: Model, msg: Message) -> Model {
    if msg.is_edit() && !model.can_edit() {
        return model;
    }

    match msg {
        // Relay
        Message::RelayConnected(session_id) => {
            match qr_rows(&session_id) {
                Ok(rows) => model.pairing_code = rows,
                Err(err) => {
                    model.pairing_code.clear();
                    model.show_toast(ToastLevel::Error, format!("QR code failed: {err}"));
                }
            }
            model.session_id = Some(session_id);
            model.connected = true;
        }
        Message::RelayDisconnected(reason) => {
            model.connected = false;
            model.session_id = None;
            model.pairing_code.clear();
            model.show_toast(ToastLevel::Warning, format!("Disconnected: {reason}"));
        }
        Message::RelayUnreachable(reason) => {
            model.show_toast(ToastLevel::Error, format!("Relay unreachable: {reason}"));
        }
        Message::RelayRejected(reason) => {
            model.show_toast(ToastLevel::Error, format!("Ignored relay message: {reason}"));
        }
        Message::RemoteUpdate { from, .. } if from.trim().is_empty() => {
            model.show_toast(ToastLevel::Error, "Ignored update without a sender");
        }
        Message::RemoteUpdate { from, data } => {
            match NoteContent::from_wire(model.note.variant(), data) {
                Ok(content) => {
                    model.note.replace(content);
                    model.target = Some(from);
                    model.request_persist();
                    ensure_cursor_visible(&mut model);
                }
                Err(err) => {
                    model.show_toast(
                        ToastLevel::Error,
                        format!("Ignored update from {from}: {err}"),
                    );
                }
            }
        }

        // Pairing
        Message::ScanDecoded(payload) => {
            let payload = payload.trim();
            if model.target.is_none() && !payload.is_empty() {
                model.target = Some(payload.to_string());
                model.queue_update();
            }
        }
        Message::Rescan => {
            model.target = None;
        }

        // Editor
        Message::InsertChar(ch) => {
            let changed = model.note.insert_char(ch);
            after_edit(&mut model, changed);
        }
        Message::InsertText(text) => {
            let changed = model.note.insert_text(&text);
            after_edit(&mut model, changed);
        }
        Message::DeleteBack => {
            let changed = model.note.delete_back();
            after_edit(&mut model, changed);
        }
        Message::DeleteForward => {
            let changed = model.note.delete_forward();
            after_edit(&mut model, changed);
        }
        Message::SplitLine => {
            let changed = model.note.split_line();
            after_edit(&mut model, changed);
        }
        Message::ToggleStyle(style) => {
            let changed = model.note.toggle_style(&style);
            after_edit(&mut model, changed);
        }
        Message::CycleBlockType => {
            let changed = model.note.cycle_block_type();
            after_edit(&mut model, changed);
        }
        Message::MoveCursor(dir) => {
            model.note.move_cursor(dir);
            ensure_cursor_visible(&mut model);
        }
        Message::MoveHome => model.note.move_home(),
        Message::MoveEnd => model.note.move_end(),
        Message::MoveWordLeft => {
            model.note.move_word_left();
            ensure_cursor_visible(&mut model);
        }
        Message::MoveWordRight => {
            model.note.move_word_right();
            ensure_cursor_visible(&mut model);
        }
        Message::MoveToStart => {
            model.note.move_to_start();
            ensure_cursor_visible(&mut model);
        }
        Message::MoveToEnd => {
            model.note.move_to_end();
            ensure_cursor_visible(&mut model);
        }
        Message::ScrollUp(n) => {
            model.editor_scroll_offset = model.editor_scroll_offset.saturating_sub(n);
        }
        Message::ScrollDown(n) => {
            let max = model.note.buffer().line_count().saturating_sub(1);
            model.editor_scroll_offset = (model.editor_scroll_offset + n).min(max);
        }

        Message::ToggleHelp => {
            model.help_visible = !model.help_visible;
        }
        Message::HideHelp => {
            model.help_visible = false;
        }

        // Window
        Message::Resize(width, height) => {
            model.terminal_size = (width, height);
            ensure_cursor_visible(&mut model);
        }
        Message::Redraw => {}

        // Application
        Message::Quit => {
            model.should_quit = true;
        }
    }
    model
}

/// One content change, one outbound update.
fn after_edit(model: &mut Model, changed: bool) {
    if changed {
        model.queue_update();
        model.request_persist();
    }
    ensure_cursor_visible(model);
}

/// Ensure the cursor line is visible in the note area.
fn ensure_cursor_visible(model: &mut Model) {
    let cursor_line = model.note.cursor().line;
    let visible_height = model.note_rows();
    if visible_height == 0 {
        model.editor_scroll_offset = cursor_line;
        return;
    }

    if cursor_line < model.editor_scroll_offset {
        model.editor_scroll_offset = cursor_line;
    } else if cursor_line >= model.editor_scroll_offset + visible_height {
        model.editor_scroll_offset = cursor_line + 1 - visible_height;
    }
}
