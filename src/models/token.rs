//! Token data structures
//!
//! Tokens are produced once per document tokenization and are immutable.
//! Only the transient view-facing fields (`array_index`, `text_part`,
//! `codable`) are rewritten when a unit window is resolved.

use serde::{Deserialize, Serialize};

/// Which part of the rendered window a token belongs to
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum TextPart {
    /// Inside the primary unit range (codable)
    TextUnit,
    /// Context shown before the unit (visible, not codable)
    ContextBefore,
    /// Context shown after the unit (visible, not codable)
    ContextAfter,
}

impl Default for TextPart {
    fn default() -> Self {
        TextPart::TextUnit
    }
}

/// One token of a tokenized document
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Token {
    /// Absolute position in the full document token stream (stable)
    pub index: usize,

    /// Position within the currently rendered window
    pub array_index: usize,

    /// Character offset in the source text
    pub offset: usize,

    /// Length in characters
    pub length: usize,

    /// The token text itself
    pub text: String,

    /// Paragraph number (0-based, document-wide)
    pub paragraph: usize,

    /// Sentence number (0-based, document-wide)
    pub sentence: usize,

    /// Whether the token may carry annotations in the current window
    pub codable: bool,

    /// Partition tag assigned by the window resolver
    #[serde(default)]
    pub text_part: TextPart,
}

impl Token {
    /// Create a new token; `array_index` starts out equal to `index`
    pub fn new(
        index: usize,
        offset: usize,
        text: String,
        paragraph: usize,
        sentence: usize,
    ) -> Self {
        let length = text.chars().count();
        Self {
            index,
            array_index: index,
            offset,
            length,
            text,
            paragraph,
            sentence,
            codable: true,
            text_part: TextPart::TextUnit,
        }
    }

    /// Exclusive end of the character range covered by this token
    pub fn end_offset(&self) -> usize {
        self.offset + self.length
    }
}
