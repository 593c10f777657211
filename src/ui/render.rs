use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

use crate::app::Model;
use crate::note::BlockType;
use crate::note::rich::Block as NoteBlock;

use super::{overlays, status, style};

pub const PAIRING_HEADING: &str = "Socket QR Code:";
pub const PAIRING_PLACEHOLDER: &str = "connect to generate the QR Code";
pub const NOTE_PLACEHOLDER: &str = "connect to send updates";
pub const TARGET_LABEL: &str = "Sending updates to:";

/// Bordered scanner box: one notice row plus borders.
const SCANNER_HEIGHT: u16 = 3;

/// Screen regions, top to bottom.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sections {
    pub pairing: Rect,
    pub target: Rect,
    pub scanner: Option<Rect>,
    pub note: Rect,
    pub toast: Option<Rect>,
    pub status: Rect,
}

pub fn layout_sections(model: &Model, area: Rect) -> Sections {
    let scanner = model.scanner_visible();
    let toast = model.active_toast().is_some();

    let mut constraints = vec![
        Constraint::Length(pairing_height(model)),
        Constraint::Length(1),
    ];
    if scanner {
        constraints.push(Constraint::Length(SCANNER_HEIGHT));
    }
    constraints.push(Constraint::Min(3));
    if toast {
        constraints.push(Constraint::Length(1));
    }
    constraints.push(Constraint::Length(1));

    let chunks = Layout::vertical(constraints).split(area);
    let mut next = chunks.iter().copied();
    let mut take = || next.next().unwrap_or_default();
    let pairing = take();
    let target = take();
    let scanner = scanner.then(&mut take);
    let note = take();
    let toast = toast.then(&mut take);
    let status = take();
    Sections {
        pairing,
        target,
        scanner,
        note,
        toast,
        status,
    }
}

/// Text rows available to the note body at the model's terminal size.
pub fn note_area_height(model: &Model) -> u16 {
    let (width, height) = model.terminal_size;
    let sections = layout_sections(model, Rect::new(0, 0, width, height));
    note_frame(model).inner(sections.note).height
}

fn pairing_height(model: &Model) -> u16 {
    let body = if model.pairing_ready() {
        // Code rows plus the session id underneath.
        u16::try_from(model.pairing_code.len()).unwrap_or(u16::MAX).saturating_add(1)
    } else {
        1
    };
    body.saturating_add(1)
}

/// Render the complete UI.
pub fn render(model: &Model, frame: &mut Frame) {
    let area = frame.area();
    let sections = layout_sections(model, area);

    render_pairing(model, frame, sections.pairing);
    render_target(model, frame, sections.target);
    if let Some(scanner) = sections.scanner {
        render_scanner(model, frame, scanner);
    }
    render_note(model, frame, sections.note);
    if let Some(toast) = sections.toast {
        status::render_toast_bar(model, frame, toast);
    }
    status::render_status_bar(model, frame, sections.status);

    if model.help_visible {
        overlays::render_help_overlay(model, frame, area);
    }
}

fn render_pairing(model: &Model, frame: &mut Frame, area: Rect) {
    let heading = Style::default().add_modifier(Modifier::BOLD);
    let mut lines = vec![Line::styled(PAIRING_HEADING, heading)];
    match model.session_id.as_deref() {
        Some(session_id) if model.pairing_ready() => {
            lines.extend(model.pairing_code.iter().map(|row| Line::raw(row.as_str())));
            lines.push(Line::styled(
                session_id,
                Style::default().fg(Color::Indexed(245)),
            ));
        }
        _ => lines.push(Line::styled(
            PAIRING_PLACEHOLDER,
            Style::default().fg(Color::Indexed(245)),
        )),
    }
    frame.render_widget(Paragraph::new(lines), area);
}

fn render_target(model: &Model, frame: &mut Frame, area: Rect) {
    let target = model.target.as_deref().unwrap_or_default();
    let line = Line::from(vec![
        Span::raw(format!("{TARGET_LABEL} ")),
        Span::styled(target, Style::default().fg(Color::Cyan)),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

fn render_scanner(model: &Model, frame: &mut Frame, area: Rect) {
    let text = model.capability.notice().map_or_else(
        || match &model.capability {
            crate::pairing::ScanCapability::Camera(path) => {
                format!("looking for a QR code in {}", path.display())
            }
            _ => String::new(),
        },
        str::to_string,
    );
    let block = Block::default().title("Scanner").borders(Borders::ALL);
    frame.render_widget(
        Paragraph::new(text)
            .block(block)
            .wrap(Wrap { trim: true }),
        area,
    );
}

fn note_frame(model: &Model) -> Block<'static> {
    Block::default()
        .borders(Borders::TOP)
        .title(format!(" Note ({}) ", model.note.variant().as_str()))
}

fn render_note(model: &Model, frame: &mut Frame, area: Rect) {
    let block = note_frame(model);
    let inner = block.inner(area);
    frame.render_widget(Clear, area);
    frame.render_widget(block, area);

    if !model.can_edit() {
        let placeholder =
            Paragraph::new(NOTE_PLACEHOLDER).style(Style::default().fg(Color::Indexed(245)));
        frame.render_widget(placeholder, inner);
        return;
    }

    let buffer = model.note.buffer();
    let total_lines = buffer.line_count();
    let start = model.editor_scroll_offset.min(total_lines.saturating_sub(1));
    let end = (start + usize::from(inner.height)).min(total_lines);
    let cursor = model.note.cursor();
    let cursor_col = buffer.cursor_char_col();

    let mut ordinal = 0usize;
    for idx in 0..start {
        ordinal = next_ordinal(model.note.block(idx), ordinal);
    }

    let mut content: Vec<Line> = Vec::new();
    for line_idx in start..end {
        let text = buffer.line_at(line_idx).unwrap_or_default();
        let block = model.note.block(line_idx);
        ordinal = next_ordinal(block, ordinal);

        let base = block.map_or_else(Style::default, |b| style::style_for_block(&b.kind));
        let prefix = block.map_or_else(String::new, |b| {
            style::block_prefix(&b.kind, b.depth, ordinal)
        });

        let mut spans = Vec::new();
        if !prefix.is_empty() {
            spans.push(Span::styled(prefix, Style::default().fg(Color::DarkGray)));
        }
        let at = (line_idx == cursor.line).then_some(cursor_col);
        spans.extend(styled_spans(&text, base, block, at));
        content.push(Line::from(spans));
    }

    frame.render_widget(Paragraph::new(content), inner);
}

fn next_ordinal(block: Option<&NoteBlock>, previous: usize) -> usize {
    match block.map(|b| &b.kind) {
        Some(BlockType::OrderedListItem) => previous + 1,
        _ => 0,
    }
}

/// Split a line into runs of equal style; the cursor cell is drawn inverted.
fn styled_spans(
    text: &str,
    base: Style,
    block: Option<&NoteBlock>,
    cursor_col: Option<usize>,
) -> Vec<Span<'static>> {
    let cursor_style = Style::default().bg(Color::White).fg(Color::Black);
    let mut spans = Vec::new();
    let mut run = String::new();
    let mut run_style = base;
    let mut len = 0;

    for (idx, ch) in text.chars().enumerate() {
        let style = if cursor_col == Some(idx) {
            cursor_style
        } else {
            block.map_or(base, |b| style::style_for_inline(base, b.styles_at(idx)))
        };
        if style != run_style && !run.is_empty() {
            spans.push(Span::styled(std::mem::take(&mut run), run_style));
        }
        run_style = style;
        run.push(ch);
        len = idx + 1;
    }
    if !run.is_empty() {
        spans.push(Span::styled(run, run_style));
    }
    if cursor_col.is_some_and(|col| col >= len) {
        spans.push(Span::styled(" ", cursor_style));
    }
    spans
}
