use super::*;
use crate::app::{Message, Model, update};
use crate::note::{BlockType, NoteContent, Variant};
use crate::pairing::ScanCapability;
use ratatui::Terminal;
use ratatui::backend::TestBackend;

fn create_test_terminal() -> Terminal<TestBackend> {
    let backend = TestBackend::new(80, 40);
    Terminal::new(backend).unwrap()
}

fn model_with(capability: ScanCapability) -> Model {
    Model::new(NoteContent::empty(Variant::Plain), capability, (80, 40))
}

/// Draw `model` and return the screen as one string per row.
fn screen_rows(model: &Model) -> Vec<String> {
    let mut terminal = create_test_terminal();
    terminal.draw(|frame| render(model, frame)).unwrap();
    let buffer = terminal.backend().buffer();
    let width = usize::from(buffer.area.width);
    let cells: Vec<&str> = buffer.content().iter().map(|c| c.symbol()).collect();
    cells.chunks(width).map(|row| row.concat()).collect()
}

fn screen_text(model: &Model) -> String {
    screen_rows(model).join("\n")
}

fn paired(mut model: Model) -> Model {
    model = update(model, Message::RelayConnected("self-id".to_string()));
    model.target = Some("abc123".to_string());
    model
}

#[test]
fn test_placeholder_before_connect() {
    let text = screen_text(&model_with(ScanCapability::Unsupported));
    assert!(text.contains(PAIRING_HEADING));
    assert!(text.contains(PAIRING_PLACEHOLDER));
    assert!(text.contains(NOTE_PLACEHOLDER));
    assert!(text.contains("disconnected"));
}

#[test]
fn test_qr_code_and_session_id_after_connect() {
    let model = update(
        model_with(ScanCapability::Unsupported),
        Message::RelayConnected("sid-42".to_string()),
    );
    let rows = screen_rows(&model);
    let text = rows.join("\n");
    assert!(!text.contains(PAIRING_PLACEHOLDER));
    assert!(text.contains("sid-42"));
    // Rows 1.. hold the code exactly as rendered.
    assert_eq!(rows[1].trim_end(), model.pairing_code[0].trim_end());
}

#[test]
fn test_desktop_shows_mobile_only_notice() {
    let text = screen_text(&model_with(ScanCapability::Unsupported));
    assert!(text.contains("Scanner"));
    assert!(text.contains("only available on mobile devices"));
}

#[test]
fn test_handheld_without_camera_shows_notice() {
    let text = screen_text(&model_with(ScanCapability::NoCamera));
    assert!(text.contains("no camera available"));
}

#[test]
fn test_camera_scanner_names_frame_file() {
    let text = screen_text(&model_with(ScanCapability::Camera("frame.png".into())));
    assert!(text.contains("looking for a QR code in frame.png"));
}

#[test]
fn test_connected_but_unpaired_keeps_placeholder() {
    let model = update(
        model_with(ScanCapability::Unsupported),
        Message::RelayConnected("sid".to_string()),
    );
    assert!(screen_text(&model).contains(NOTE_PLACEHOLDER));
}

#[test]
fn test_paired_shows_target_and_note() {
    let mut model = paired(model_with(ScanCapability::Unsupported));
    model = update(model, Message::InsertText("shopping list".to_string()));
    let text = screen_text(&model);
    assert!(text.contains(&format!("{TARGET_LABEL} abc123")));
    assert!(text.contains("shopping list"));
    assert!(!text.contains(NOTE_PLACEHOLDER));
    assert!(!text.contains("Scanner"));
    assert!(text.contains("Ln 1, Col 14"));
}

#[test]
fn test_disconnect_hides_note_behind_placeholder() {
    let mut model = paired(model_with(ScanCapability::Unsupported));
    model = update(model, Message::InsertText("secret".to_string()));
    model = update(model, Message::RelayDisconnected("transport close".to_string()));
    let text = screen_text(&model);
    assert!(text.contains(NOTE_PLACEHOLDER));
    assert!(!text.contains("secret"));
    assert!(text.contains("[warn] Disconnected: transport close"));
}

#[test]
fn test_rich_note_draws_list_prefix() {
    let mut model = Model::new(
        NoteContent::empty(Variant::Rich),
        ScanCapability::Unsupported,
        (80, 40),
    );
    model = paired(model);
    model = update(model, Message::InsertText("eggs".to_string()));
    // unstyled -> header-one -> ... until unordered-list-item
    while model.note.block(0).map(|b| &b.kind) != Some(&BlockType::UnorderedListItem) {
        model = update(model, Message::CycleBlockType);
    }
    assert!(screen_text(&model).contains("• eggs"));
}

#[test]
fn test_help_overlay_lists_keys_and_relay() {
    let model = update(model_with(ScanCapability::Unsupported), Message::ToggleHelp);
    let text = screen_text(&model);
    assert!(text.contains("Help"));
    assert!(text.contains("Ctrl+R"));
    assert!(text.contains("note-mirror.herokuapp.com"));
    assert!(text.contains("any key closes"));
}

#[test]
fn test_layout_reserves_scanner_only_while_unpaired() {
    let area = ratatui::layout::Rect::new(0, 0, 80, 40);
    let model = model_with(ScanCapability::Unsupported);
    assert!(layout_sections(&model, area).scanner.is_some());

    let model = paired(model);
    let sections = layout_sections(&model, area);
    assert!(sections.scanner.is_none());
    assert_eq!(sections.status.y, 39);
}

#[test]
fn test_note_area_grows_when_scanner_closes() {
    let model = model_with(ScanCapability::Unsupported);
    let before = note_area_height(&model);
    let mut model = model;
    model.target = Some("abc123".to_string());
    assert_eq!(note_area_height(&model), before + 3);
}

#[test]
fn test_status_column_counts_wide_characters() {
    let mut model = paired(model_with(ScanCapability::Unsupported));
    model = update(model, Message::InsertText("日本".to_string()));
    assert!(screen_text(&model).contains("Ln 1, Col 5"));
}
