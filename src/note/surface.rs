use serde_json::Value;

use crate::editor::{Cursor, Direction, Edit, EditorBuffer};

use super::content::{NoteContent, Variant};
use super::rich::{Block, InlineStyle, RichDocument, is_line_break};

/// The editable note: a text buffer plus, for rich notes, the block model
/// that tracks it line for line.
pub struct NoteSurface {
    buffer: EditorBuffer,
    rich: Option<RichDocument>,
}

impl Default for NoteSurface {
    fn default() -> Self {
        Self::new(NoteContent::empty(Variant::Rich))
    }
}

impl NoteSurface {
    pub fn new(content: NoteContent) -> Self {
        match content {
            NoteContent::Plain(text) => Self {
                buffer: EditorBuffer::from_text(&text),
                rich: None,
            },
            NoteContent::Rich(doc) => Self {
                buffer: EditorBuffer::from_text(&doc.plain_text()),
                rich: Some(doc),
            },
        }
    }

    pub const fn variant(&self) -> Variant {
        if self.rich.is_some() {
            Variant::Rich
        } else {
            Variant::Plain
        }
    }

    pub const fn buffer(&self) -> &EditorBuffer {
        &self.buffer
    }

    pub const fn cursor(&self) -> Cursor {
        self.buffer.cursor()
    }

    pub fn text(&self) -> String {
        self.buffer.text()
    }

    /// Block metadata for `line`, rich notes only.
    pub fn block(&self, line: usize) -> Option<&Block> {
        self.rich.as_ref().and_then(|doc| doc.block(line))
    }

    pub fn content(&self) -> NoteContent {
        match &self.rich {
            Some(doc) => NoteContent::Rich(doc.clone()),
            None => NoteContent::Plain(self.buffer.text()),
        }
    }

    pub fn to_wire(&self) -> Value {
        self.content().to_wire()
    }

    /// Replace everything with `content` (a remote update). The cursor is
    /// clamped into the new text.
    pub fn replace(&mut self, content: NoteContent) {
        match content {
            NoteContent::Plain(text) => {
                self.buffer.set_text(&text);
                self.rich = None;
            }
            NoteContent::Rich(doc) => {
                self.buffer.set_text(&doc.plain_text());
                self.rich = Some(doc);
            }
        }
    }

    /// Type one char. Newlines split the line; other line breaks are dropped.
    pub fn insert_char(&mut self, ch: char) -> bool {
        if ch == '\n' {
            return self.split_line();
        }
        if is_line_break(ch) {
            return false;
        }
        let edit = self.buffer.insert_char(ch);
        self.follow(edit)
    }

    /// Paste a run of text.
    pub fn insert_text(&mut self, text: &str) -> bool {
        let normalized = text.replace("\r\n", "\n");
        let mut changed = false;
        for ch in normalized.chars() {
            changed |= self.insert_char(ch);
        }
        changed
    }

    pub fn split_line(&mut self) -> bool {
        let edit = self.buffer.split_line();
        self.follow(Some(edit))
    }

    pub fn delete_back(&mut self) -> bool {
        let edit = self.buffer.delete_back();
        self.follow(edit)
    }

    pub fn delete_forward(&mut self) -> bool {
        let edit = self.buffer.delete_forward();
        self.follow(edit)
    }

    /// Toggle an inline style over the cursor's block. Plain notes ignore it.
    pub fn toggle_style(&mut self, style: &InlineStyle) -> bool {
        let line = self.buffer.cursor().line;
        self.rich
            .as_mut()
            .is_some_and(|doc| doc.toggle_style(line, style))
    }

    /// Cycle the block type of the cursor's block. Plain notes ignore it.
    pub fn cycle_block_type(&mut self) -> bool {
        let line = self.buffer.cursor().line;
        self.rich
            .as_mut()
            .is_some_and(|doc| doc.cycle_block_type(line))
    }

    pub fn move_cursor(&mut self, direction: Direction) {
        self.buffer.move_cursor(direction);
    }

    pub const fn move_home(&mut self) {
        self.buffer.move_home();
    }

    pub fn move_end(&mut self) {
        self.buffer.move_end();
    }

    pub fn move_word_left(&mut self) {
        self.buffer.move_word_left();
    }

    pub fn move_word_right(&mut self) {
        self.buffer.move_word_right();
    }

    pub const fn move_to_start(&mut self) {
        self.buffer.move_to_start();
    }

    pub fn move_to_end(&mut self) {
        self.buffer.move_to_end();
    }

    fn follow(&mut self, edit: Option<Edit>) -> bool {
        let Some(edit) = edit else {
            return false;
        };
        if let Some(doc) = self.rich.as_mut() {
            match edit {
                Edit::Insert { line, at, len } => {
                    let text = self.buffer.line_at(line).unwrap_or_default();
                    let inserted: String = text.chars().skip(at).take(len).collect();
                    doc.insert(line, at, &inserted);
                }
                Edit::Remove { line, at, len } => doc.remove(line, at, len),
                Edit::Split { line, at } => doc.split(line, at),
                Edit::Join { line } => doc.join(line),
            }
        }
        true
    }
}

impl std::fmt::Debug for NoteSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NoteSurface")
            .field("variant", &self.variant())
            .field("buffer", &self.buffer)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::note::rich::{BlockType, StyleRange};

    fn rich_surface(text: &str) -> NoteSurface {
        NoteSurface::new(NoteContent::Rich(RichDocument::from_plain(text)))
    }

    fn assert_aligned(surface: &NoteSurface) {
        let NoteContent::Rich(doc) = surface.content() else {
            panic!("expected rich content");
        };
        assert_eq!(doc.plain_text(), surface.text());
        assert_eq!(doc.blocks().len(), surface.buffer().line_count());
    }

    #[test]
    fn test_typing_keeps_blocks_aligned() {
        let mut surface = rich_surface("");
        for ch in "hello\nwörld".chars() {
            assert!(surface.insert_char(ch));
        }
        assert_aligned(&surface);
        surface.delete_back();
        surface.move_to_start();
        surface.move_end();
        surface.delete_forward();
        assert_eq!(surface.text(), "hellowörl");
        assert_aligned(&surface);
    }

    #[test]
    fn test_bold_follows_typing() {
        let mut surface = rich_surface("hi");
        assert!(surface.toggle_style(&InlineStyle::Bold));
        surface.move_end();
        surface.insert_char('!');
        let block = surface.block(0).unwrap();
        assert_eq!(
            block.styles,
            vec![StyleRange {
                offset: 0,
                length: 3,
                style: InlineStyle::Bold
            }]
        );
    }

    #[test]
    fn test_metadata_change_reports_change() {
        let mut surface = rich_surface("title");
        assert!(surface.cycle_block_type());
        assert_eq!(surface.block(0).unwrap().kind, BlockType::Header(1));
    }

    #[test]
    fn test_plain_surface_ignores_rich_controls() {
        let mut surface = NoteSurface::new(NoteContent::Plain("text".to_string()));
        assert!(!surface.toggle_style(&InlineStyle::Bold));
        assert!(!surface.cycle_block_type());
        assert_eq!(surface.content(), NoteContent::Plain("text".to_string()));
    }

    #[test]
    fn test_stray_carriage_return_is_dropped() {
        let mut surface = rich_surface("");
        assert!(surface.insert_text("a\r\nb\rc"));
        assert_eq!(surface.text(), "a\nbc");
        assert_aligned(&surface);
    }

    #[test]
    fn test_replace_clamps_cursor() {
        let mut surface = rich_surface("a long first line\nsecond");
        surface.move_to_end();
        surface.replace(NoteContent::Rich(RichDocument::from_plain("x")));
        assert_eq!(surface.cursor(), Cursor::at(0, 1));
        assert_eq!(surface.text(), "x");
    }
}
