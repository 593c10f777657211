//! Structured note document: ordered blocks with inline styling.
//!
//! Offsets in this module are counted in chars. The wire form in
//! [`super::raw`] converts them to UTF-16 units.

use std::collections::BTreeMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use serde_json::{Map, Value};

pub use crate::editor::is_line_break;

/// Length of generated block keys.
const KEY_LEN: usize = 5;

/// Block-level formatting.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BlockType {
    Unstyled,
    Header(u8),
    UnorderedListItem,
    OrderedListItem,
    Blockquote,
    CodeBlock,
    Atomic,
    /// A type this client does not render, kept so it survives a round trip.
    Other(String),
}

impl BlockType {
    pub fn parse(name: &str) -> Self {
        match name {
            "unstyled" => Self::Unstyled,
            "header-one" => Self::Header(1),
            "header-two" => Self::Header(2),
            "header-three" => Self::Header(3),
            "header-four" => Self::Header(4),
            "header-five" => Self::Header(5),
            "header-six" => Self::Header(6),
            "unordered-list-item" => Self::UnorderedListItem,
            "ordered-list-item" => Self::OrderedListItem,
            "blockquote" => Self::Blockquote,
            "code-block" => Self::CodeBlock,
            "atomic" => Self::Atomic,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Unstyled => "unstyled",
            Self::Header(1) => "header-one",
            Self::Header(2) => "header-two",
            Self::Header(3) => "header-three",
            Self::Header(4) => "header-four",
            Self::Header(5) => "header-five",
            Self::Header(_) => "header-six",
            Self::UnorderedListItem => "unordered-list-item",
            Self::OrderedListItem => "ordered-list-item",
            Self::Blockquote => "blockquote",
            Self::CodeBlock => "code-block",
            Self::Atomic => "atomic",
            Self::Other(name) => name,
        }
    }

    /// Next type in the Ctrl+T cycle. Types outside the cycle restart it.
    pub fn cycled(&self) -> Self {
        match self {
            Self::Unstyled => Self::Header(1),
            Self::Header(1) => Self::Header(2),
            Self::Header(2) => Self::Header(3),
            Self::Header(_) => Self::UnorderedListItem,
            Self::UnorderedListItem => Self::OrderedListItem,
            Self::OrderedListItem => Self::Blockquote,
            Self::Blockquote => Self::CodeBlock,
            Self::CodeBlock | Self::Atomic | Self::Other(_) => Self::Unstyled,
        }
    }

    /// The type given to the lower half when a block is split.
    fn after_split(&self) -> Self {
        match self {
            Self::Header(_) | Self::Atomic => Self::Unstyled,
            other => other.clone(),
        }
    }
}

/// Character-level formatting.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum InlineStyle {
    Bold,
    Italic,
    Underline,
    Code,
    Strikethrough,
    Custom(String),
}

impl InlineStyle {
    pub fn parse(name: &str) -> Self {
        match name {
            "BOLD" => Self::Bold,
            "ITALIC" => Self::Italic,
            "UNDERLINE" => Self::Underline,
            "CODE" => Self::Code,
            "STRIKETHROUGH" => Self::Strikethrough,
            other => Self::Custom(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Bold => "BOLD",
            Self::Italic => "ITALIC",
            Self::Underline => "UNDERLINE",
            Self::Code => "CODE",
            Self::Strikethrough => "STRIKETHROUGH",
            Self::Custom(name) => name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleRange {
    pub offset: usize,
    pub length: usize,
    pub style: InlineStyle,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityRange {
    pub offset: usize,
    pub length: usize,
    pub key: usize,
}

/// An annotation (link, mention, image) referenced from entity ranges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    pub kind: String,
    pub mutability: String,
    pub data: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub key: String,
    pub text: String,
    pub kind: BlockType,
    pub depth: u32,
    pub styles: Vec<StyleRange>,
    pub entities: Vec<EntityRange>,
    pub data: Map<String, Value>,
}

impl Block {
    pub fn unstyled(key: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            text: text.into(),
            kind: BlockType::Unstyled,
            depth: 0,
            styles: Vec::new(),
            entities: Vec::new(),
            data: Map::new(),
        }
    }

    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    /// Styles active on the char at `idx`.
    pub fn styles_at(&self, idx: usize) -> impl Iterator<Item = &InlineStyle> {
        self.styles
            .iter()
            .filter(move |r| r.offset <= idx && idx < r.offset + r.length)
            .map(|r| &r.style)
    }
}

/// A rich note: at least one block, plus the entity map its ranges point at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RichDocument {
    blocks: Vec<Block>,
    entities: BTreeMap<usize, Entity>,
}

impl Default for RichDocument {
    fn default() -> Self {
        Self::empty()
    }
}

impl RichDocument {
    /// A document holding one empty unstyled block.
    pub fn empty() -> Self {
        let mut doc = Self {
            blocks: Vec::new(),
            entities: BTreeMap::new(),
        };
        doc.blocks.push(Block::unstyled(doc.fresh_key(), ""));
        doc
    }

    /// One unstyled block per line of `text`.
    pub fn from_plain(text: &str) -> Self {
        let mut doc = Self {
            blocks: Vec::new(),
            entities: BTreeMap::new(),
        };
        for line in text.replace("\r\n", "\n").split(is_line_break) {
            let key = doc.fresh_key();
            doc.blocks.push(Block::unstyled(key, line));
        }
        doc
    }

    /// Assemble a document. An empty block list becomes one empty block.
    pub fn from_parts(blocks: Vec<Block>, entities: BTreeMap<usize, Entity>) -> Self {
        if blocks.is_empty() {
            let mut doc = Self::empty();
            doc.entities = entities;
            return doc;
        }
        Self { blocks, entities }
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn entities(&self) -> &BTreeMap<usize, Entity> {
        &self.entities
    }

    pub fn block(&self, idx: usize) -> Option<&Block> {
        self.blocks.get(idx)
    }

    /// Block texts joined with `'\n'`.
    pub fn plain_text(&self) -> String {
        self.blocks
            .iter()
            .map(|b| b.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Insert `inserted` into block `idx` at char `at`.
    pub fn insert(&mut self, idx: usize, at: usize, inserted: &str) {
        let Some(block) = self.blocks.get_mut(idx) else {
            return;
        };
        let byte = byte_index(&block.text, at);
        block.text.insert_str(byte, inserted);
        let len = inserted.chars().count();
        for range in &mut block.styles {
            let (offset, length) = shift_for_insert(range.offset, range.length, at, len, true);
            range.offset = offset;
            range.length = length;
        }
        for range in &mut block.entities {
            let (offset, length) = shift_for_insert(range.offset, range.length, at, len, false);
            range.offset = offset;
            range.length = length;
        }
    }

    /// Remove `len` chars from block `idx` starting at char `at`.
    pub fn remove(&mut self, idx: usize, at: usize, len: usize) {
        let Some(block) = self.blocks.get_mut(idx) else {
            return;
        };
        let start = byte_index(&block.text, at);
        let end = byte_index(&block.text, at + len);
        block.text.replace_range(start..end, "");
        block.styles.retain_mut(|range| {
            let (offset, length) = shrink_for_remove(range.offset, range.length, at, len);
            range.offset = offset;
            range.length = length;
            length > 0
        });
        block.entities.retain_mut(|range| {
            let (offset, length) = shrink_for_remove(range.offset, range.length, at, len);
            range.offset = offset;
            range.length = length;
            length > 0
        });
    }

    /// Split block `idx` at char `at`; the tail becomes a new block after it.
    pub fn split(&mut self, idx: usize, at: usize) {
        if idx >= self.blocks.len() {
            return;
        }
        let key = self.fresh_key();
        let block = &mut self.blocks[idx];
        let byte = byte_index(&block.text, at);
        let tail_text = block.text.split_off(byte);

        let mut tail = Block {
            key,
            text: tail_text,
            kind: block.kind.after_split(),
            depth: block.depth,
            styles: Vec::new(),
            entities: Vec::new(),
            data: Map::new(),
        };

        let mut head_styles = Vec::new();
        for range in block.styles.drain(..) {
            let (head, rest) = split_range(range.offset, range.length, at);
            if let Some((offset, length)) = head {
                head_styles.push(StyleRange {
                    offset,
                    length,
                    style: range.style.clone(),
                });
            }
            if let Some((offset, length)) = rest {
                tail.styles.push(StyleRange {
                    offset,
                    length,
                    style: range.style,
                });
            }
        }
        block.styles = head_styles;

        let mut head_entities = Vec::new();
        for range in block.entities.drain(..) {
            let (head, rest) = split_range(range.offset, range.length, at);
            if let Some((offset, length)) = head {
                head_entities.push(EntityRange {
                    offset,
                    length,
                    key: range.key,
                });
            }
            if let Some((offset, length)) = rest {
                tail.entities.push(EntityRange {
                    offset,
                    length,
                    key: range.key,
                });
            }
        }
        block.entities = head_entities;

        self.blocks.insert(idx + 1, tail);
    }

    /// Append block `idx + 1` onto block `idx`. The upper block's type wins.
    pub fn join(&mut self, idx: usize) {
        if idx + 1 >= self.blocks.len() {
            return;
        }
        let lower = self.blocks.remove(idx + 1);
        let upper = &mut self.blocks[idx];
        let shift = upper.char_len();
        upper.text.push_str(&lower.text);
        upper
            .styles
            .extend(lower.styles.into_iter().map(|r| StyleRange {
                offset: r.offset + shift,
                ..r
            }));
        upper
            .entities
            .extend(lower.entities.into_iter().map(|r| EntityRange {
                offset: r.offset + shift,
                ..r
            }));
    }

    /// Toggle `style` over the whole of block `idx`.
    ///
    /// Returns false when the block is empty or missing.
    pub fn toggle_style(&mut self, idx: usize, style: &InlineStyle) -> bool {
        let Some(block) = self.blocks.get_mut(idx) else {
            return false;
        };
        let len = block.char_len();
        if len == 0 {
            return false;
        }
        let covered = block
            .styles
            .iter()
            .any(|r| &r.style == style && r.offset == 0 && r.length >= len);
        block.styles.retain(|r| &r.style != style);
        if !covered {
            block.styles.push(StyleRange {
                offset: 0,
                length: len,
                style: style.clone(),
            });
        }
        true
    }

    /// Advance block `idx` to the next block type.
    pub fn cycle_block_type(&mut self, idx: usize) -> bool {
        let Some(block) = self.blocks.get_mut(idx) else {
            return false;
        };
        block.kind = block.kind.cycled();
        true
    }

    /// A key not used by any block in this document.
    fn fresh_key(&self) -> String {
        let mut attempt = 0u64;
        loop {
            let mut hasher = DefaultHasher::new();
            self.blocks.len().hash(&mut hasher);
            attempt.hash(&mut hasher);
            for block in &self.blocks {
                block.key.hash(&mut hasher);
            }
            let key = base36(hasher.finish(), KEY_LEN);
            if !self.blocks.iter().any(|b| b.key == key) {
                return key;
            }
            attempt += 1;
        }
    }
}

fn base36(mut value: u64, len: usize) -> String {
    const DIGITS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let mut out = String::with_capacity(len);
    for _ in 0..len {
        out.push(char::from(DIGITS[(value % 36) as usize]));
        value /= 36;
    }
    out
}

/// Byte index of char `idx` in `s`, clamped to the end.
fn byte_index(s: &str, idx: usize) -> usize {
    s.char_indices().nth(idx).map_or(s.len(), |(b, _)| b)
}

/// New `(offset, length)` after `len` chars are inserted at `at`.
///
/// Text typed at the end of a styled run continues the run when
/// `extend_at_end` is set; entities only grow for strictly interior inserts.
const fn shift_for_insert(
    offset: usize,
    length: usize,
    at: usize,
    len: usize,
    extend_at_end: bool,
) -> (usize, usize) {
    let end = offset + length;
    if at <= offset {
        (offset + len, length)
    } else if at < end || (extend_at_end && at == end) {
        (offset, length + len)
    } else {
        (offset, length)
    }
}

/// New `(offset, length)` after chars `at..at + len` are removed.
fn shrink_for_remove(offset: usize, length: usize, at: usize, len: usize) -> (usize, usize) {
    let end = offset + length;
    let cut_end = at + len;
    let overlap = end.min(cut_end).saturating_sub(offset.max(at));
    let new_offset = if offset >= cut_end {
        offset - len
    } else if offset >= at {
        at
    } else {
        offset
    };
    (new_offset, length - overlap)
}

type Part = Option<(usize, usize)>;

/// Partition a range around a split point: the part before `at` and the part
/// after it, re-based to the new block.
const fn split_range(offset: usize, length: usize, at: usize) -> (Part, Part) {
    let end = offset + length;
    if end <= at {
        (Some((offset, length)), None)
    } else if offset >= at {
        (None, Some((offset - at, length)))
    } else {
        (Some((offset, at - offset)), Some((0, end - at)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bold(offset: usize, length: usize) -> StyleRange {
        StyleRange {
            offset,
            length,
            style: InlineStyle::Bold,
        }
    }

    fn doc_with(text: &str, styles: Vec<StyleRange>) -> RichDocument {
        let mut block = Block::unstyled("a0000", text);
        block.styles = styles;
        RichDocument::from_parts(vec![block], BTreeMap::new())
    }

    #[test]
    fn test_empty_document_has_one_block() {
        let doc = RichDocument::empty();
        assert_eq!(doc.blocks().len(), 1);
        assert_eq!(doc.blocks()[0].text, "");
        assert_eq!(doc.blocks()[0].key.len(), KEY_LEN);
    }

    #[test]
    fn test_from_plain_keys_are_unique() {
        let doc = RichDocument::from_plain("a\nb\nc\nd");
        let mut keys: Vec<_> = doc.blocks().iter().map(|b| b.key.clone()).collect();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), 4);
        assert_eq!(doc.plain_text(), "a\nb\nc\nd");
    }

    #[test]
    fn test_typing_at_end_of_bold_extends_it() {
        let mut doc = doc_with("hello", vec![bold(0, 5)]);
        doc.insert(0, 5, "!");
        assert_eq!(doc.blocks()[0].styles, vec![bold(0, 6)]);
    }

    #[test]
    fn test_typing_before_range_shifts_it() {
        let mut doc = doc_with("hello", vec![bold(1, 2)]);
        doc.insert(0, 1, "xx");
        assert_eq!(doc.blocks()[0].text, "hxxello");
        assert_eq!(doc.blocks()[0].styles, vec![bold(3, 2)]);
    }

    #[test]
    fn test_entity_does_not_grow_at_end() {
        let mut block = Block::unstyled("a0000", "link");
        block.entities.push(EntityRange {
            offset: 0,
            length: 4,
            key: 0,
        });
        let mut doc = RichDocument::from_parts(vec![block], BTreeMap::new());
        doc.insert(0, 4, "s");
        assert_eq!(doc.blocks()[0].entities[0].length, 4);
    }

    #[test]
    fn test_remove_shrinks_and_drops_ranges() {
        let mut doc = doc_with("abcdef", vec![bold(1, 2), bold(4, 2)]);
        doc.remove(0, 0, 3);
        assert_eq!(doc.blocks()[0].text, "def");
        assert_eq!(doc.blocks()[0].styles, vec![bold(1, 2)]);

        doc.remove(0, 1, 2);
        assert!(doc.blocks()[0].styles.is_empty());
    }

    #[test]
    fn test_split_partitions_ranges() {
        let mut doc = doc_with("hello world", vec![bold(3, 5)]);
        doc.split(0, 6);
        let blocks = doc.blocks();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].text, "hello ");
        assert_eq!(blocks[1].text, "world");
        assert_eq!(blocks[0].styles, vec![bold(3, 3)]);
        assert_eq!(blocks[1].styles, vec![bold(0, 2)]);
        assert_ne!(blocks[0].key, blocks[1].key);
    }

    #[test]
    fn test_split_header_yields_unstyled_tail() {
        let mut doc = RichDocument::from_plain("Title");
        doc.cycle_block_type(0);
        doc.split(0, 5);
        assert_eq!(doc.blocks()[0].kind, BlockType::Header(1));
        assert_eq!(doc.blocks()[1].kind, BlockType::Unstyled);
    }

    #[test]
    fn test_split_list_keeps_type() {
        let mut doc = RichDocument::from_plain("item");
        doc.blocks[0].kind = BlockType::UnorderedListItem;
        doc.split(0, 2);
        assert_eq!(doc.blocks()[1].kind, BlockType::UnorderedListItem);
    }

    #[test]
    fn test_join_shifts_lower_ranges() {
        let mut doc = RichDocument::from_plain("ab\ncd");
        doc.blocks[1].styles.push(bold(0, 2));
        doc.join(0);
        assert_eq!(doc.blocks().len(), 1);
        assert_eq!(doc.blocks()[0].text, "abcd");
        assert_eq!(doc.blocks()[0].styles, vec![bold(2, 2)]);
    }

    #[test]
    fn test_toggle_style_round_trip() {
        let mut doc = RichDocument::from_plain("note");
        assert!(doc.toggle_style(0, &InlineStyle::Bold));
        assert_eq!(doc.blocks()[0].styles, vec![bold(0, 4)]);
        assert!(doc.toggle_style(0, &InlineStyle::Bold));
        assert!(doc.blocks()[0].styles.is_empty());
    }

    #[test]
    fn test_toggle_style_on_empty_block_is_noop() {
        let mut doc = RichDocument::empty();
        assert!(!doc.toggle_style(0, &InlineStyle::Italic));
    }

    #[test]
    fn test_block_type_names_round_trip() {
        for name in [
            "unstyled",
            "header-one",
            "header-six",
            "ordered-list-item",
            "code-block",
            "x-custom",
        ] {
            assert_eq!(BlockType::parse(name).as_str(), name);
        }
    }

    #[test]
    fn test_cycle_returns_to_unstyled() {
        let mut kind = BlockType::Unstyled;
        for _ in 0..8 {
            kind = kind.cycled();
        }
        assert_eq!(kind, BlockType::Unstyled);
    }
}
