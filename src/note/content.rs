use serde_json::Value;

use super::raw::{RawContent, convert_from_raw, convert_to_raw};
use super::rich::RichDocument;

/// Which representation the note uses on this client and on the wire.
#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Variant {
    /// A literal string, optionally persisted on this device.
    Plain,
    /// Blocks with inline styling, sent as raw content objects.
    #[default]
    Rich,
}

impl Variant {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Plain => "plain",
            Self::Rich => "rich",
        }
    }
}

/// Why an inbound payload could not become note content.
#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    #[error("expected a text payload, got {0}")]
    ExpectedText(&'static str),
    #[error("malformed raw content: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("block {block}: range {offset}+{length} is outside the text")]
    RangeOutOfBounds {
        block: String,
        offset: usize,
        length: usize,
    },
    #[error("block {block}: entity {key} is not in the entity map")]
    UnknownEntity { block: String, key: usize },
    #[error("entity map key {0:?} is not a number")]
    BadEntityKey(String),
    #[error("block key {0:?} appears twice")]
    DuplicateKey(String),
    #[error("block {0} contains a line break")]
    MultilineBlock(String),
}

/// The note's state in one of its two representations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoteContent {
    Plain(String),
    Rich(RichDocument),
}

impl NoteContent {
    pub fn empty(variant: Variant) -> Self {
        match variant {
            Variant::Plain => Self::Plain(String::new()),
            Variant::Rich => Self::Rich(RichDocument::empty()),
        }
    }

    pub const fn variant(&self) -> Variant {
        match self {
            Self::Plain(_) => Variant::Plain,
            Self::Rich(_) => Variant::Rich,
        }
    }

    /// The text with blocks separated by newlines.
    pub fn text(&self) -> String {
        match self {
            Self::Plain(text) => text.clone(),
            Self::Rich(doc) => doc.plain_text(),
        }
    }

    /// Transmissible form: a JSON string or a raw content object.
    pub fn to_wire(&self) -> Value {
        match self {
            Self::Plain(text) => Value::String(text.clone()),
            // Raw content holds only strings, numbers and maps; it always serializes.
            Self::Rich(doc) => serde_json::to_value(convert_to_raw(doc)).unwrap_or(Value::Null),
        }
    }

    /// Decode an inbound payload for `variant`.
    ///
    /// # Errors
    ///
    /// Returns a [`ContentError`] when the payload has the wrong shape for the
    /// variant or its raw ranges do not fit the block text.
    pub fn from_wire(variant: Variant, data: Value) -> Result<Self, ContentError> {
        match variant {
            Variant::Plain => match data {
                Value::String(text) => Ok(Self::Plain(text)),
                other => Err(ContentError::ExpectedText(json_kind(&other))),
            },
            Variant::Rich => {
                let raw: RawContent = serde_json::from_value(data)?;
                Ok(Self::Rich(convert_from_raw(raw)?))
            }
        }
    }
}

const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
