use ratatui::prelude::*;
use ratatui::widgets::Paragraph;
use unicode_width::UnicodeWidthStr;

use crate::app::Model;

pub fn render_status_bar(model: &Model, frame: &mut Frame, area: Rect) {
    let connection = if model.connected {
        "connected"
    } else {
        "disconnected"
    };
    let cursor_info = if model.can_edit() {
        let cursor = model.note.cursor();
        format!("  Ln {}, Col {}", cursor.line + 1, display_column(model) + 1)
    } else {
        String::new()
    };
    let status = format!(
        " {connection}  [{}]{cursor_info}  F1:help",
        model.note.variant().as_str()
    );

    let style = if model.connected {
        Style::default().bg(Color::DarkGray).fg(Color::White)
    } else {
        Style::default().bg(Color::Red).fg(Color::White)
    };
    frame.render_widget(Paragraph::new(status).style(style), area);
}

pub fn render_toast_bar(model: &Model, frame: &mut Frame, area: Rect) {
    let Some((message, level)) = model.active_toast() else {
        return;
    };
    let (prefix, style) = match level {
        crate::app::ToastLevel::Warning => (
            "[warn]",
            Style::default().bg(Color::Yellow).fg(Color::Black),
        ),
        crate::app::ToastLevel::Error => {
            ("[error]", Style::default().bg(Color::Red).fg(Color::White))
        }
    };
    let toast = Paragraph::new(format!("{prefix} {message}")).style(style);
    frame.render_widget(toast, area);
}

/// Terminal column of the cursor; wide characters count twice.
fn display_column(model: &Model) -> usize {
    let buffer = model.note.buffer();
    let line = buffer.line_at(model.note.cursor().line).unwrap_or_default();
    let before: String = line.chars().take(buffer.cursor_char_col()).collect();
    before.width()
}
