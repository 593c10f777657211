use ropey::Rope;

/// Cursor position in the editor buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    /// Zero-based line index.
    pub line: usize,
    /// Zero-based column (byte offset within the line).
    pub col: usize,
    /// Remembered column for vertical movement (sticky column).
    col_memory: usize,
}

impl Cursor {
    /// Create a cursor at line 0, column 0.
    pub const fn new() -> Self {
        Self {
            line: 0,
            col: 0,
            col_memory: 0,
        }
    }

    /// Create a cursor at a specific position.
    pub const fn at(line: usize, col: usize) -> Self {
        Self {
            line,
            col,
            col_memory: col,
        }
    }

    const fn set_col(&mut self, col: usize) {
        self.col = col;
        self.col_memory = col;
    }
}

impl Default for Cursor {
    fn default() -> Self {
        Self::new()
    }
}

/// Direction for cursor movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

/// A content change applied to the buffer, in char coordinates.
///
/// Callers that keep per-line metadata (block styles, entity ranges) replay
/// these to stay aligned with the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edit {
    /// `len` chars inserted into `line` at char index `at`.
    Insert { line: usize, at: usize, len: usize },
    /// `len` chars removed from `line` starting at char index `at`.
    Remove { line: usize, at: usize, len: usize },
    /// `line` split in two at char index `at`.
    Split { line: usize, at: usize },
    /// `line + 1` appended onto `line`.
    Join { line: usize },
}

/// A text buffer backed by a rope.
///
/// Lines map one-to-one onto note blocks. Every mutating call reports the
/// [`Edit`] it performed, or `None` when nothing changed.
pub struct EditorBuffer {
    rope: Rope,
    cursor: Cursor,
}

impl EditorBuffer {
    /// Create a new buffer from a string.
    pub fn from_text(text: &str) -> Self {
        Self {
            rope: Rope::from_str(text),
            cursor: Cursor::new(),
        }
    }

    /// Create an empty buffer.
    pub fn empty() -> Self {
        Self::from_text("")
    }

    /// The current cursor position.
    pub const fn cursor(&self) -> Cursor {
        self.cursor
    }

    /// Total number of lines in the buffer.
    pub fn line_count(&self) -> usize {
        self.rope.len_lines()
    }

    /// Get the content of a line (without trailing newline).
    pub fn line_at(&self, line_idx: usize) -> Option<String> {
        if line_idx >= self.rope.len_lines() {
            return None;
        }
        let s = self.rope.line(line_idx).to_string();
        Some(s.trim_end_matches(is_line_break).to_string())
    }

    /// Length of a line in bytes (without trailing newline).
    pub fn line_len(&self, line_idx: usize) -> usize {
        self.line_at(line_idx).map_or(0, |s| s.len())
    }

    /// The full text content of the buffer.
    pub fn text(&self) -> String {
        self.rope.to_string()
    }

    /// Replace the whole text, keeping the cursor as close as possible to
    /// where it was.
    pub fn set_text(&mut self, text: &str) {
        self.rope = Rope::from_str(text);
        let line = self.cursor.line.min(self.line_count().saturating_sub(1));
        let col = floor_char_boundary(&self.line_at(line).unwrap_or_default(), self.cursor.col);
        self.cursor = Cursor::at(line, col);
    }

    /// Cursor column counted in chars rather than bytes.
    pub fn cursor_char_col(&self) -> usize {
        self.line_at(self.cursor.line)
            .map_or(0, |line| line[..self.cursor.col.min(line.len())].chars().count())
    }

    /// Insert a character at the cursor position.
    ///
    /// A `'\n'` splits the line instead.
    pub fn insert_char(&mut self, ch: char) -> Option<Edit> {
        if ch == '\n' {
            return Some(self.split_line());
        }
        let at = self.cursor_char_col();
        let char_idx = self.cursor_char_idx();
        self.rope.insert_char(char_idx, ch);
        self.cursor.set_col(self.cursor.col + ch.len_utf8());
        Some(Edit::Insert {
            line: self.cursor.line,
            at,
            len: 1,
        })
    }

    /// Split the current line at the cursor (Enter key).
    pub fn split_line(&mut self) -> Edit {
        let edit = Edit::Split {
            line: self.cursor.line,
            at: self.cursor_char_col(),
        };
        let char_idx = self.cursor_char_idx();
        self.rope.insert_char(char_idx, '\n');
        self.cursor.line += 1;
        self.cursor.set_col(0);
        edit
    }

    /// Delete the character before the cursor (Backspace).
    pub fn delete_back(&mut self) -> Option<Edit> {
        if self.cursor.col == 0 && self.cursor.line == 0 {
            return None;
        }

        let char_idx = self.cursor_char_idx();
        let edit = if self.cursor.col == 0 {
            let upper = self.cursor.line - 1;
            let upper_len = self.line_len(upper);
            let upper_end = self.rope.line_to_char(upper) + self.line_char_len(upper);
            self.rope.remove(upper_end..char_idx);
            self.cursor.line = upper;
            self.cursor.set_col(upper_len);
            Edit::Join { line: upper }
        } else {
            let line = self.line_at(self.cursor.line).unwrap_or_default();
            let before = &line[..self.cursor.col];
            let prev_char_len = before.chars().next_back().map_or(1, char::len_utf8);
            let at = before.chars().count() - 1;
            self.rope.remove(char_idx - 1..char_idx);
            self.cursor.set_col(self.cursor.col - prev_char_len);
            Edit::Remove {
                line: self.cursor.line,
                at,
                len: 1,
            }
        };
        Some(edit)
    }

    /// Delete the character at the cursor (Delete key).
    pub fn delete_forward(&mut self) -> Option<Edit> {
        let line_len = self.line_len(self.cursor.line);
        if self.cursor.col >= line_len && self.cursor.line + 1 >= self.line_count() {
            return None;
        }

        let char_idx = self.cursor_char_idx();
        let edit = if self.cursor.col >= line_len {
            // Only the line break goes; the newline char may be "\r\n".
            let line_start = self.rope.line_to_char(self.cursor.line);
            let next_start = self.rope.line_to_char(self.cursor.line + 1);
            self.rope.remove(line_start + self.line_char_len(self.cursor.line)..next_start);
            Edit::Join {
                line: self.cursor.line,
            }
        } else {
            self.rope.remove(char_idx..=char_idx);
            Edit::Remove {
                line: self.cursor.line,
                at: self.cursor_char_col(),
                len: 1,
            }
        };
        Some(edit)
    }

    /// Move the cursor in the given direction.
    pub fn move_cursor(&mut self, direction: Direction) {
        match direction {
            Direction::Left => self.move_left(),
            Direction::Right => self.move_right(),
            Direction::Up => self.move_vertical(-1),
            Direction::Down => self.move_vertical(1),
        }
    }

    /// Move cursor to the beginning of the line (Home).
    pub const fn move_home(&mut self) {
        self.cursor.set_col(0);
    }

    /// Move cursor to the end of the line (End).
    pub fn move_end(&mut self) {
        let len = self.line_len(self.cursor.line);
        self.cursor.set_col(len);
    }

    /// Move cursor one word to the left (Ctrl+Left).
    pub fn move_word_left(&mut self) {
        if self.cursor.col == 0 {
            if self.cursor.line > 0 {
                self.cursor.line -= 1;
                self.cursor.set_col(self.line_len(self.cursor.line));
            }
            return;
        }

        let line = self.line_at(self.cursor.line).unwrap_or_default();
        let trimmed = line[..self.cursor.col].trim_end();
        let pos = trimmed
            .rfind(|c: char| !c.is_alphanumeric() && c != '_')
            .map_or(0, |i| i + trimmed[i..].chars().next().map_or(1, char::len_utf8));
        self.cursor.set_col(pos);
    }

    /// Move cursor one word to the right (Ctrl+Right).
    pub fn move_word_right(&mut self) {
        let line_len = self.line_len(self.cursor.line);
        if self.cursor.col >= line_len {
            if self.cursor.line + 1 < self.line_count() {
                self.cursor.line += 1;
                self.cursor.set_col(0);
            }
            return;
        }

        let line = self.line_at(self.cursor.line).unwrap_or_default();
        let after = &line[self.cursor.col..];
        let word_end = after
            .find(|c: char| !c.is_alphanumeric() && c != '_')
            .unwrap_or(after.len());
        let rest = &after[word_end..];
        let gap = rest
            .find(|c: char| c.is_alphanumeric() || c == '_')
            .unwrap_or(rest.len());
        self.cursor.set_col(self.cursor.col + word_end + gap);
    }

    /// Move cursor to a specific line and byte column, clamped to the text.
    #[cfg(test)]
    pub fn move_to(&mut self, line: usize, col: usize) {
        self.cursor.line = line.min(self.line_count().saturating_sub(1));
        let text = self.line_at(self.cursor.line).unwrap_or_default();
        self.cursor.set_col(floor_char_boundary(&text, col));
    }

    /// Move cursor to the start of the buffer (Ctrl+Home).
    pub const fn move_to_start(&mut self) {
        self.cursor.line = 0;
        self.cursor.set_col(0);
    }

    /// Move cursor to the end of the buffer (Ctrl+End).
    pub fn move_to_end(&mut self) {
        let last_line = self.line_count().saturating_sub(1);
        self.cursor.line = last_line;
        self.cursor.set_col(self.line_len(last_line));
    }

    fn line_char_len(&self, line_idx: usize) -> usize {
        self.line_at(line_idx).map_or(0, |s| s.chars().count())
    }

    /// Convert cursor position to a ropey char index.
    fn cursor_char_idx(&self) -> usize {
        self.rope.line_to_char(self.cursor.line) + self.cursor_char_col()
    }

    fn move_left(&mut self) {
        if self.cursor.col > 0 {
            let line = self.line_at(self.cursor.line).unwrap_or_default();
            let prev_char_len = line[..self.cursor.col]
                .chars()
                .next_back()
                .map_or(1, char::len_utf8);
            self.cursor.set_col(self.cursor.col - prev_char_len);
        } else if self.cursor.line > 0 {
            self.cursor.line -= 1;
            self.cursor.set_col(self.line_len(self.cursor.line));
        }
    }

    fn move_right(&mut self) {
        let line = self.line_at(self.cursor.line).unwrap_or_default();
        if self.cursor.col < line.len() {
            let next_char_len = line[self.cursor.col..]
                .chars()
                .next()
                .map_or(1, char::len_utf8);
            self.cursor.set_col(self.cursor.col + next_char_len);
        } else if self.cursor.line + 1 < self.line_count() {
            self.cursor.line += 1;
            self.cursor.set_col(0);
        }
    }

    fn move_vertical(&mut self, delta: isize) {
        let Some(target) = self.cursor.line.checked_add_signed(delta) else {
            return;
        };
        if target >= self.line_count() {
            return;
        }
        self.cursor.line = target;
        let line = self.line_at(target).unwrap_or_default();
        self.cursor.col = floor_char_boundary(&line, self.cursor.col_memory);
    }
}

/// Largest char boundary in `s` that is `<= col`.
fn floor_char_boundary(s: &str, col: usize) -> usize {
    let mut col = col.min(s.len());
    while !s.is_char_boundary(col) {
        col -= 1;
    }
    col
}

/// Every char the rope ends a line on; `\r\n` counts once.
pub const fn is_line_break(c: char) -> bool {
    matches!(
        c,
        '\n' | '\r' | '\u{0B}' | '\u{0C}' | '\u{85}' | '\u{2028}' | '\u{2029}'
    )
}

impl std::fmt::Debug for EditorBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorBuffer")
            .field(
                "rope",
                &format_args!("Rope({} lines)", self.rope.len_lines()),
            )
            .field("cursor", &self.cursor)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_buffer_has_one_line() {
        let buf = EditorBuffer::empty();
        assert_eq!(buf.line_count(), 1);
        assert_eq!(buf.line_at(0), Some(String::new()));
    }

    #[test]
    fn test_from_text_trailing_newline() {
        let buf = EditorBuffer::from_text("hello\n");
        assert_eq!(buf.line_count(), 2);
        assert_eq!(buf.line_at(1), Some(String::new()));
    }

    #[test]
    fn test_insert_reports_char_offsets() {
        let mut buf = EditorBuffer::from_text("héllo");
        buf.move_end();
        let edit = buf.insert_char('!');
        assert_eq!(
            edit,
            Some(Edit::Insert {
                line: 0,
                at: 5,
                len: 1
            })
        );
        assert_eq!(buf.text(), "héllo!");
    }

    #[test]
    fn test_insert_newline_splits() {
        let mut buf = EditorBuffer::from_text("abcd");
        buf.move_to(0, 2);
        assert_eq!(buf.insert_char('\n'), Some(Edit::Split { line: 0, at: 2 }));
        assert_eq!(buf.text(), "ab\ncd");
        assert_eq!(buf.cursor(), Cursor::at(1, 0));
    }

    #[test]
    fn test_unicode_line_separators_are_not_line_text() {
        let mut buf = EditorBuffer::from_text("ab\u{2028}cd\u{85}ef");
        assert_eq!(buf.line_count(), 3);
        assert_eq!(buf.line_at(0).as_deref(), Some("ab"));
        assert_eq!(buf.line_at(1).as_deref(), Some("cd"));

        buf.move_to(1, 0);
        assert_eq!(buf.delete_back(), Some(Edit::Join { line: 0 }));
        assert_eq!(buf.text(), "abcd\u{85}ef");
        assert_eq!(buf.cursor(), Cursor::at(0, 2));

        buf.move_end();
        assert_eq!(buf.delete_forward(), Some(Edit::Join { line: 0 }));
        assert_eq!(buf.text(), "abcdef");
    }

    #[test]
    fn test_delete_back_at_origin_is_noop() {
        let mut buf = EditorBuffer::from_text("abc");
        assert_eq!(buf.delete_back(), None);
        assert_eq!(buf.text(), "abc");
    }

    #[test]
    fn test_delete_back_multibyte() {
        let mut buf = EditorBuffer::from_text("aé");
        buf.move_end();
        assert_eq!(
            buf.delete_back(),
            Some(Edit::Remove {
                line: 0,
                at: 1,
                len: 1
            })
        );
        assert_eq!(buf.text(), "a");
        assert_eq!(buf.cursor().col, 1);
    }

    #[test]
    fn test_delete_back_joins_lines() {
        let mut buf = EditorBuffer::from_text("ab\ncd");
        buf.move_to(1, 0);
        assert_eq!(buf.delete_back(), Some(Edit::Join { line: 0 }));
        assert_eq!(buf.text(), "abcd");
        assert_eq!(buf.cursor(), Cursor::at(0, 2));
    }

    #[test]
    fn test_delete_forward_joins_crlf() {
        let mut buf = EditorBuffer::from_text("ab\r\ncd");
        buf.move_end();
        assert_eq!(buf.delete_forward(), Some(Edit::Join { line: 0 }));
        assert_eq!(buf.text(), "abcd");
    }

    #[test]
    fn test_delete_forward_at_end_is_noop() {
        let mut buf = EditorBuffer::from_text("ab");
        buf.move_end();
        assert_eq!(buf.delete_forward(), None);
    }

    #[test]
    fn test_set_text_clamps_cursor() {
        let mut buf = EditorBuffer::from_text("line one\nline two");
        buf.move_to_end();
        buf.set_text("x");
        assert_eq!(buf.cursor(), Cursor::at(0, 1));
        assert_eq!(buf.text(), "x");
    }

    #[test]
    fn test_set_text_lands_on_char_boundary() {
        let mut buf = EditorBuffer::from_text("abc");
        buf.move_to(0, 2);
        buf.set_text("é");
        assert_eq!(buf.cursor().col, 0);
    }

    #[test]
    fn test_vertical_movement_remembers_column() {
        let mut buf = EditorBuffer::from_text("hello\nhi\nworld");
        buf.move_to(0, 4);
        buf.move_cursor(Direction::Down);
        assert_eq!(buf.cursor().col, 2);
        buf.move_cursor(Direction::Down);
        assert_eq!(buf.cursor().col, 4);
    }

    #[test]
    fn test_word_movement() {
        let mut buf = EditorBuffer::from_text("hello big world");
        buf.move_word_right();
        assert_eq!(buf.cursor().col, 6);
        buf.move_end();
        buf.move_word_left();
        assert_eq!(buf.cursor().col, 10);
    }
}
