//! Unit and context-window descriptors
//!
//! A unit describes the granularity of work presented to the coder; the
//! context unit describes how much surrounding text is shown around it.
//! Both are tagged variants validated at construction time, not
//! duck-typed objects with optional fields.

use serde::{Deserialize, Serialize};

use crate::models::TokenSpan;

/// The unit of work presented to the coder
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(tag = "textUnit", rename_all = "camelCase")]
pub enum TextUnit {
    /// The whole document
    Document,
    /// One paragraph, by document-wide paragraph number
    Paragraph { index: usize },
    /// One sentence, by document-wide sentence number
    Sentence { index: usize },
    /// An existing annotation span, by inclusive token-index range
    Span { span: TokenSpan },
}

impl Default for TextUnit {
    fn default() -> Self {
        TextUnit::Document
    }
}

/// The field used for the context window around a unit
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ContextScope {
    /// Show the whole document as context
    Document,
    /// Show surrounding paragraphs
    Paragraph,
    /// Show surrounding sentences
    Sentence,
    /// Show no context at all
    None,
}

/// Context-window descriptor: scope plus (before, after) counts per field
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ContextUnit {
    pub selected: ContextScope,
    /// (before, after) paragraph counts
    pub paragraph: (usize, usize),
    /// (before, after) sentence counts
    pub sentence: (usize, usize),
}

impl ContextUnit {
    pub fn new(selected: ContextScope) -> Self {
        Self {
            selected,
            paragraph: (1, 1),
            sentence: (2, 2),
        }
    }

    /// The (before, after) counts for the selected scope
    pub fn selected_range(&self) -> (usize, usize) {
        match self.selected {
            ContextScope::Paragraph => self.paragraph,
            ContextScope::Sentence => self.sentence,
            ContextScope::Document | ContextScope::None => (0, 0),
        }
    }
}

impl Default for ContextUnit {
    fn default() -> Self {
        Self::new(ContextScope::Document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selected_range() {
        let mut context = ContextUnit::new(ContextScope::Paragraph);
        context.paragraph = (2, 0);
        assert_eq!(context.selected_range(), (2, 0));

        context.selected = ContextScope::Sentence;
        assert_eq!(context.selected_range(), (2, 2));

        context.selected = ContextScope::Document;
        assert_eq!(context.selected_range(), (0, 0));
    }

    #[test]
    fn test_text_unit_serde_tag() {
        let unit = TextUnit::Paragraph { index: 3 };
        let json = serde_json::to_string(&unit).unwrap();
        assert!(json.contains("\"textUnit\":\"paragraph\""));
        let back: TextUnit = serde_json::from_str(&json).unwrap();
        assert_eq!(back, unit);
    }
}
