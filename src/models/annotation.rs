//! Annotation data structures
//!
//! Annotations are persisted in character-offset form (`RawAnnotation`)
//! and expanded onto the token stream for rendering and lookup
//! (`SpanEntry`, one instance per covered token).

use serde::{Deserialize, Serialize};

/// Identifier for one annotation span, issued by the annotation index
#[derive(
    Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
pub struct AnnotationId(pub u64);

/// A character-offset annotation, as persisted
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct RawAnnotation {
    /// Character offset in the source text
    pub offset: usize,
    /// Length in characters
    pub length: usize,
    /// The codebook variable this annotation belongs to
    pub variable: String,
    /// The assigned code value
    pub value: String,
}

impl RawAnnotation {
    pub fn new(offset: usize, length: usize, variable: &str, value: &str) -> Self {
        Self {
            offset,
            length,
            variable: variable.to_string(),
            value: value.to_string(),
        }
    }

    /// Exclusive end of the character range
    pub fn end_offset(&self) -> usize {
        self.offset + self.length
    }
}

/// An inclusive token-index range covered by one annotation span
pub type TokenSpan = (usize, usize);

/// One (token, covering span) pair in the expanded annotation index
///
/// For a span `(s, e)`, the entry with `index == s` is the left boundary
/// and the entry with `index == e` the right boundary. Single-token spans
/// are both. All entries sharing an id carry the identical span and value.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct SpanEntry {
    pub id: AnnotationId,
    pub variable: String,
    pub value: String,
    /// Inclusive token-index range of the whole span
    pub span: TokenSpan,
    /// This token's position within the span
    pub index: usize,
}

impl SpanEntry {
    /// Whether this entry sits at the left edge of its span
    pub fn is_left_boundary(&self) -> bool {
        self.index == self.span.0
    }

    /// Whether this entry sits at the right edge of its span
    pub fn is_right_boundary(&self) -> bool {
        self.index == self.span.1
    }
}
