use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseEventKind};

use crate::app::{App, Message, Model};
use crate::editor::Direction;
use crate::note::InlineStyle;

use super::event_loop::ResizeDebouncer;

/// Lines moved per mouse wheel notch.
const WHEEL_STEP: usize = 3;

impl App {
    pub(super) fn handle_event(
        event: Event,
        model: &Model,
        now_ms: u64,
        resize_debouncer: &mut ResizeDebouncer,
    ) -> Option<Message> {
        match event {
            Event::Key(key) if key.kind != KeyEventKind::Release => Self::handle_key(key, model),
            Event::Paste(text) if model.can_edit() && !model.help_visible => {
                Some(Message::InsertText(text))
            }
            Event::Mouse(mouse) if !model.help_visible => match mouse.kind {
                MouseEventKind::ScrollUp => Some(Message::ScrollUp(WHEEL_STEP)),
                MouseEventKind::ScrollDown => Some(Message::ScrollDown(WHEEL_STEP)),
                _ => None,
            },
            Event::Resize(w, h) => {
                crate::perf::log_event("event.resize.queue", format!("width={w} height={h}"));
                resize_debouncer.queue(w, h, now_ms);
                None
            }
            _ => None,
        }
    }

    pub(super) fn handle_key(key: KeyEvent, model: &Model) -> Option<Message> {
        if model.help_visible {
            return Some(Message::HideHelp);
        }

        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let alt = key.modifiers.contains(KeyModifiers::ALT);

        // Always available
        match key.code {
            KeyCode::Char('c' | 'q') if ctrl => return Some(Message::Quit),
            KeyCode::Char('r') if ctrl => return Some(Message::Rescan),
            KeyCode::F(1) => return Some(Message::ToggleHelp),
            KeyCode::Char('l') if ctrl => return Some(Message::Redraw),
            KeyCode::PageUp => return Some(Message::ScrollUp(model.note_rows().max(1))),
            KeyCode::PageDown => return Some(Message::ScrollDown(model.note_rows().max(1))),
            _ => {}
        }

        // The note is read-only until connected and paired.
        if !model.can_edit() {
            return None;
        }

        match key.code {
            KeyCode::Char('b') if ctrl => Some(Message::ToggleStyle(InlineStyle::Bold)),
            // Ctrl+I reaches us as Tab.
            KeyCode::Char('i') if alt => Some(Message::ToggleStyle(InlineStyle::Italic)),
            KeyCode::Char('u') if ctrl => Some(Message::ToggleStyle(InlineStyle::Underline)),
            KeyCode::Char('t') if ctrl => Some(Message::CycleBlockType),
            KeyCode::Char(c) if !ctrl && !alt => Some(Message::InsertChar(c)),
            KeyCode::Enter => Some(Message::SplitLine),
            KeyCode::Backspace => Some(Message::DeleteBack),
            KeyCode::Delete => Some(Message::DeleteForward),
            KeyCode::Left if ctrl => Some(Message::MoveWordLeft),
            KeyCode::Right if ctrl => Some(Message::MoveWordRight),
            KeyCode::Home if ctrl => Some(Message::MoveToStart),
            KeyCode::End if ctrl => Some(Message::MoveToEnd),
            KeyCode::Left => Some(Message::MoveCursor(Direction::Left)),
            KeyCode::Right => Some(Message::MoveCursor(Direction::Right)),
            KeyCode::Up => Some(Message::MoveCursor(Direction::Up)),
            KeyCode::Down => Some(Message::MoveCursor(Direction::Down)),
            KeyCode::Home => Some(Message::MoveHome),
            KeyCode::End => Some(Message::MoveEnd),
            _ => None,
        }
    }
}
