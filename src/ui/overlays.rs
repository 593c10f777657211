use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Padding, Paragraph};

use crate::app::Model;

pub fn render_help_overlay(model: &Model, frame: &mut Frame, area: Rect) {
    let popup_width = area.width.saturating_sub(12).max(48);
    let popup_height = area.height.saturating_sub(4).max(12);
    let popup = centered_popup_rect(popup_width, popup_height, area);

    let global_cfg = model
        .config_global_path
        .as_ref()
        .map_or_else(|| "<unknown>".to_string(), |p| p.display().to_string());
    let local_cfg = model
        .config_local_path
        .as_ref()
        .map_or_else(|| "<none>".to_string(), |p| p.display().to_string());
    let store = model
        .store_path
        .as_ref()
        .map_or_else(|| "<not persisted>".to_string(), |p| p.display().to_string());

    let section_style = Style::default()
        .fg(Color::Yellow)
        .add_modifier(Modifier::BOLD);
    let dim_style = Style::default().fg(Color::Indexed(245));

    let mut lines: Vec<Line> = Vec::new();

    lines.push(Line::styled("Note", section_style));
    lines.push(Line::raw("  Type to edit        Every change is sent to the peer"));
    lines.push(Line::raw("  Arrows, Home/End    Navigate"));
    lines.push(Line::raw("  Ctrl+Left/Right     Word movement"));
    lines.push(Line::raw("  Ctrl+Home/End       Note start / end"));
    lines.push(Line::raw("  PageUp/PageDown     Scroll"));
    lines.push(Line::raw(""));

    lines.push(Line::styled("Rich text", section_style));
    lines.push(Line::raw("  Ctrl+B / Alt+I      Bold / italic on the current line"));
    lines.push(Line::raw("  Ctrl+U              Underline on the current line"));
    lines.push(Line::raw("  Ctrl+T              Cycle block type"));
    lines.push(Line::raw(""));

    lines.push(Line::styled("Pairing", section_style));
    lines.push(Line::raw("  Ctrl+R              Forget the peer and scan again"));
    lines.push(Line::raw(""));

    lines.push(Line::styled("Other", section_style));
    lines.push(Line::raw("  Ctrl+L              Redraw"));
    lines.push(Line::raw("  Ctrl+C / Ctrl+Q     Quit"));
    lines.push(Line::raw("  F1                  Toggle help"));
    lines.push(Line::raw(""));

    lines.push(Line::styled("Config", section_style));
    lines.push(Line::raw(format!("  Relay: {}", model.relay_url)));
    lines.push(Line::raw(format!("  Global: {global_cfg}")));
    lines.push(Line::raw(format!("  Local override: {local_cfg}")));
    lines.push(Line::raw(format!("  Note file: {store}")));

    let block = Block::default()
        .title("Help")
        .borders(Borders::ALL)
        .padding(Padding::uniform(1))
        .style(Style::default().bg(Color::Black).fg(Color::White));

    frame.render_widget(Clear, popup);
    frame.render_widget(block, popup);

    // Inner area: border(1) + padding(1) on each side = 4
    let inner = Rect::new(
        popup.x + 2,
        popup.y + 2,
        popup.width.saturating_sub(4),
        popup.height.saturating_sub(4),
    );

    // Reserve 1 row at bottom for footer hint
    let content_height = inner.height.saturating_sub(1);
    let visible: Vec<Line> = lines
        .into_iter()
        .take(usize::from(content_height))
        .collect();
    let content_area = Rect::new(inner.x, inner.y, inner.width, content_height);
    frame.render_widget(Paragraph::new(visible), content_area);

    let footer_area = Rect::new(inner.x, inner.y + content_height, inner.width, 1);
    let footer = Line::styled("any key closes", dim_style);
    frame.render_widget(Paragraph::new(footer), footer_area);
}

fn centered_popup_rect(width: u16, height: u16, area: Rect) -> Rect {
    let w = width.min(area.width);
    let h = height.min(area.height);
    let x = area.x + (area.width.saturating_sub(w) / 2);
    let y = area.y + (area.height.saturating_sub(h) / 2);
    Rect::new(x, y, w, h)
}
