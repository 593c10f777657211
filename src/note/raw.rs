//! Draft-style raw content: the plain-old-data form a rich note takes on the
//! wire.
//!
//! Range offsets and lengths are UTF-16 code units here, matching what
//! browser editors emit.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::ContentError;
use super::rich::{
    Block, BlockType, Entity, EntityRange, InlineStyle, RichDocument, StyleRange, is_line_break,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawContent {
    pub blocks: Vec<RawBlock>,
    #[serde(rename = "entityMap", default)]
    pub entity_map: BTreeMap<String, RawEntity>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawBlock {
    pub key: String,
    pub text: String,
    #[serde(rename = "type", default = "unstyled")]
    pub kind: String,
    #[serde(default)]
    pub depth: u32,
    #[serde(rename = "inlineStyleRanges", default)]
    pub inline_style_ranges: Vec<RawStyleRange>,
    #[serde(rename = "entityRanges", default)]
    pub entity_ranges: Vec<RawEntityRange>,
    #[serde(default)]
    pub data: Map<String, Value>,
}

fn unstyled() -> String {
    BlockType::Unstyled.as_str().to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawStyleRange {
    pub offset: usize,
    pub length: usize,
    pub style: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEntityRange {
    pub offset: usize,
    pub length: usize,
    pub key: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEntity {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default = "mutable")]
    pub mutability: String,
    #[serde(default)]
    pub data: Map<String, Value>,
}

fn mutable() -> String {
    "MUTABLE".to_string()
}

/// Serialize a document into its raw form.
pub fn convert_to_raw(doc: &RichDocument) -> RawContent {
    let blocks = doc
        .blocks()
        .iter()
        .map(|block| {
            let units = Utf16Index::new(&block.text);
            RawBlock {
                key: block.key.clone(),
                text: block.text.clone(),
                kind: block.kind.as_str().to_string(),
                depth: block.depth,
                inline_style_ranges: block
                    .styles
                    .iter()
                    .map(|r| {
                        let (offset, length) = units.to_units(r.offset, r.length);
                        RawStyleRange {
                            offset,
                            length,
                            style: r.style.as_str().to_string(),
                        }
                    })
                    .collect(),
                entity_ranges: block
                    .entities
                    .iter()
                    .map(|r| {
                        let (offset, length) = units.to_units(r.offset, r.length);
                        RawEntityRange {
                            offset,
                            length,
                            key: r.key,
                        }
                    })
                    .collect(),
                data: block.data.clone(),
            }
        })
        .collect();

    let entity_map = doc
        .entities()
        .iter()
        .map(|(key, entity)| {
            (
                key.to_string(),
                RawEntity {
                    kind: entity.kind.clone(),
                    mutability: entity.mutability.clone(),
                    data: entity.data.clone(),
                },
            )
        })
        .collect();

    RawContent { blocks, entity_map }
}

/// Rebuild a document from its raw form, validating every range.
///
/// # Errors
///
/// Returns a [`ContentError`] when a range falls outside its block or inside
/// a surrogate pair, an entity range names a missing entity, block keys
/// repeat, or a block contains a line break.
pub fn convert_from_raw(raw: RawContent) -> Result<RichDocument, ContentError> {
    let mut entities = BTreeMap::new();
    for (key, entity) in raw.entity_map {
        let idx = key
            .parse::<usize>()
            .map_err(|_| ContentError::BadEntityKey(key.clone()))?;
        entities.insert(
            idx,
            Entity {
                kind: entity.kind,
                mutability: entity.mutability,
                data: entity.data,
            },
        );
    }

    let mut seen = HashSet::new();
    let mut blocks = Vec::with_capacity(raw.blocks.len());
    for raw_block in raw.blocks {
        if !seen.insert(raw_block.key.clone()) {
            return Err(ContentError::DuplicateKey(raw_block.key));
        }
        if raw_block.text.chars().any(is_line_break) {
            return Err(ContentError::MultilineBlock(raw_block.key));
        }

        let units = Utf16Index::new(&raw_block.text);
        let mut styles = Vec::with_capacity(raw_block.inline_style_ranges.len());
        for range in &raw_block.inline_style_ranges {
            let (offset, length) = units
                .to_chars(range.offset, range.length)
                .ok_or_else(|| out_of_bounds(&raw_block.key, range.offset, range.length))?;
            styles.push(StyleRange {
                offset,
                length,
                style: InlineStyle::parse(&range.style),
            });
        }

        let mut entity_ranges = Vec::with_capacity(raw_block.entity_ranges.len());
        for range in &raw_block.entity_ranges {
            if !entities.contains_key(&range.key) {
                return Err(ContentError::UnknownEntity {
                    block: raw_block.key.clone(),
                    key: range.key,
                });
            }
            let (offset, length) = units
                .to_chars(range.offset, range.length)
                .ok_or_else(|| out_of_bounds(&raw_block.key, range.offset, range.length))?;
            entity_ranges.push(EntityRange {
                offset,
                length,
                key: range.key,
            });
        }

        blocks.push(Block {
            kind: BlockType::parse(&raw_block.kind),
            key: raw_block.key,
            text: raw_block.text,
            depth: raw_block.depth,
            styles,
            entities: entity_ranges,
            data: raw_block.data,
        });
    }

    Ok(RichDocument::from_parts(blocks, entities))
}

fn out_of_bounds(block: &str, offset: usize, length: usize) -> ContentError {
    ContentError::RangeOutOfBounds {
        block: block.to_string(),
        offset,
        length,
    }
}

/// UTF-16 offset of every char boundary in a string.
struct Utf16Index {
    /// `bounds[i]` is the UTF-16 offset of char `i`; the last entry is the
    /// total length.
    bounds: Vec<usize>,
}

impl Utf16Index {
    fn new(text: &str) -> Self {
        let mut bounds = Vec::with_capacity(text.len() + 1);
        let mut unit = 0;
        bounds.push(0);
        for ch in text.chars() {
            unit += ch.len_utf16();
            bounds.push(unit);
        }
        Self { bounds }
    }

    fn unit_at(&self, char_idx: usize) -> usize {
        self.bounds
            .get(char_idx)
            .or_else(|| self.bounds.last())
            .copied()
            .unwrap_or(0)
    }

    fn to_units(&self, offset: usize, length: usize) -> (usize, usize) {
        let start = self.unit_at(offset);
        let end = self.unit_at(offset + length);
        (start, end - start)
    }

    /// `None` when either end misses a char boundary or the text.
    fn to_chars(&self, offset: usize, length: usize) -> Option<(usize, usize)> {
        let start = self.bounds.binary_search(&offset).ok()?;
        let end = self.bounds.binary_search(&offset.checked_add(length)?).ok()?;
        Some((start, end - start))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn sample_raw() -> Value {
        json!({
            "blocks": [
                {
                    "key": "5p0ns",
                    "text": "Groceries 🛒 list",
                    "type": "header-two",
                    "depth": 0,
                    "inlineStyleRanges": [{ "offset": 10, "length": 7, "style": "BOLD" }],
                    "entityRanges": [],
                    "data": {}
                },
                {
                    "key": "b1d9k",
                    "text": "see the site",
                    "type": "unordered-list-item",
                    "depth": 1,
                    "inlineStyleRanges": [],
                    "entityRanges": [{ "offset": 8, "length": 4, "key": 0 }],
                    "data": { "checked": true }
                }
            ],
            "entityMap": {
                "0": { "type": "LINK", "mutability": "MUTABLE", "data": { "url": "https://example.com" } }
            }
        })
    }

    #[test]
    fn test_from_raw_converts_utf16_offsets() {
        let raw: RawContent = serde_json::from_value(sample_raw()).unwrap();
        let doc = convert_from_raw(raw).unwrap();

        let header = &doc.blocks()[0];
        assert_eq!(header.kind, BlockType::Header(2));
        // "🛒 list" is 7 UTF-16 units but 6 chars.
        assert_eq!(
            header.styles,
            vec![StyleRange {
                offset: 10,
                length: 6,
                style: InlineStyle::Bold
            }]
        );

        let item = &doc.blocks()[1];
        assert_eq!(item.depth, 1);
        assert_eq!(item.entities[0].key, 0);
        assert_eq!(doc.entities()[&0].kind, "LINK");
    }

    #[test]
    fn test_raw_round_trip_is_byte_identical() {
        let original: RawContent = serde_json::from_value(sample_raw()).unwrap();
        let doc = convert_from_raw(original.clone()).unwrap();
        assert_eq!(convert_to_raw(&doc), original);
    }

    #[test]
    fn test_missing_optional_fields_default() {
        let raw: RawContent =
            serde_json::from_value(json!({ "blocks": [{ "key": "a", "text": "hi" }] })).unwrap();
        let doc = convert_from_raw(raw).unwrap();
        assert_eq!(doc.blocks()[0].kind, BlockType::Unstyled);
        assert!(doc.entities().is_empty());
    }

    #[test]
    fn test_empty_block_list_becomes_one_empty_block() {
        let doc = convert_from_raw(RawContent {
            blocks: Vec::new(),
            entity_map: BTreeMap::new(),
        })
        .unwrap();
        assert_eq!(doc.blocks().len(), 1);
        assert_eq!(doc.plain_text(), "");
    }

    #[test]
    fn test_range_inside_surrogate_pair_is_rejected() {
        let raw: RawContent = serde_json::from_value(json!({
            "blocks": [{
                "key": "a", "text": "🛒",
                "inlineStyleRanges": [{ "offset": 1, "length": 1, "style": "BOLD" }]
            }]
        }))
        .unwrap();
        assert!(matches!(
            convert_from_raw(raw),
            Err(ContentError::RangeOutOfBounds { .. })
        ));
    }

    #[test]
    fn test_range_past_end_is_rejected() {
        let raw: RawContent = serde_json::from_value(json!({
            "blocks": [{
                "key": "a", "text": "ab",
                "inlineStyleRanges": [{ "offset": 1, "length": 5, "style": "BOLD" }]
            }]
        }))
        .unwrap();
        assert!(convert_from_raw(raw).is_err());
    }

    #[test]
    fn test_unknown_entity_is_rejected() {
        let raw: RawContent = serde_json::from_value(json!({
            "blocks": [{
                "key": "a", "text": "ab",
                "entityRanges": [{ "offset": 0, "length": 1, "key": 3 }]
            }]
        }))
        .unwrap();
        assert!(matches!(
            convert_from_raw(raw),
            Err(ContentError::UnknownEntity { key: 3, .. })
        ));
    }

    #[test]
    fn test_duplicate_keys_and_soft_newlines_are_rejected() {
        let dup: RawContent = serde_json::from_value(json!({
            "blocks": [{ "key": "a", "text": "x" }, { "key": "a", "text": "y" }]
        }))
        .unwrap();
        assert!(matches!(
            convert_from_raw(dup),
            Err(ContentError::DuplicateKey(_))
        ));

        let soft: RawContent =
            serde_json::from_value(json!({ "blocks": [{ "key": "a", "text": "x\ny" }] })).unwrap();
        assert!(matches!(
            convert_from_raw(soft),
            Err(ContentError::MultilineBlock(_))
        ));
    }

    fn arb_style() -> impl Strategy<Value = InlineStyle> {
        prop_oneof![
            Just(InlineStyle::Bold),
            Just(InlineStyle::Italic),
            Just(InlineStyle::Underline),
            Just(InlineStyle::Code),
        ]
    }

    fn arb_block() -> impl Strategy<Value = (String, Vec<(usize, usize, InlineStyle)>, u8)> {
        (
            "[a-zé🛒 ]{0,12}",
            prop::collection::vec((0usize..12, 0usize..12, arb_style()), 0..3),
            0u8..8,
        )
    }

    proptest! {
        #[test]
        fn prop_encode_then_decode_is_identity(
            specs in prop::collection::vec(arb_block(), 1..5)
        ) {
            let mut doc = RichDocument::empty();
            for _ in 1..specs.len() {
                let last = doc.blocks().len() - 1;
                let end = doc.blocks()[last].char_len();
                doc.split(last, end);
            }
            for (idx, (text, styles, cycles)) in specs.iter().enumerate() {
                doc.insert(idx, 0, text);
                for _ in 0..*cycles {
                    doc.cycle_block_type(idx);
                }
                let len = text.chars().count();
                for (offset, length, style) in styles {
                    if len > 0 {
                        let offset = offset % len;
                        let length = (*length).min(len - offset);
                        doc.remove(idx, offset, length);
                        let removed: String = text.chars().skip(offset).take(length).collect();
                        doc.insert(idx, offset, &removed);
                    }
                    doc.toggle_style(idx, style);
                }
            }

            let raw = convert_to_raw(&doc);
            let json = serde_json::to_value(&raw).unwrap();
            let back: RawContent = serde_json::from_value(json).unwrap();
            prop_assert_eq!(convert_from_raw(back).unwrap(), doc);
        }
    }
}
