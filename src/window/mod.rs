//! Token range resolution: unit + context window -> windowed token view
//!
//! Given the full document token stream, a unit descriptor and a context
//! descriptor, compute the primary token range and the (possibly larger)
//! context-inclusive window, tagging every returned token with its
//! partition. Deterministic: the same inputs always yield the same
//! window.

use crate::models::{ContextScope, ContextUnit, TextPart, TextUnit, Token, TokenSpan};

/// The resolved window: ordered token copies plus the primary range
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UnitWindow {
    /// Tokens in the window, with `array_index`, `text_part` and
    /// `codable` rewritten for this view
    pub tokens: Vec<Token>,
    /// Primary (unit) range in absolute token indices, inclusive
    pub primary: TokenSpan,
}

impl UnitWindow {
    /// The token at a window position
    pub fn get(&self, array_index: usize) -> Option<&Token> {
        self.tokens.get(array_index)
    }

    /// Absolute token index at a window position
    pub fn absolute_index(&self, array_index: usize) -> Option<usize> {
        self.get(array_index).map(|t| t.index)
    }

    /// Window position of an absolute token index, if visible
    pub fn array_index_of(&self, token_index: usize) -> Option<usize> {
        let first = self.tokens.first()?.index;
        if token_index < first {
            return None;
        }
        let at = token_index - first;
        self.tokens.get(at).map(|t| t.array_index)
    }
}

/// The token field a range lookup runs over
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum UnitField {
    Paragraph,
    Sentence,
}

impl UnitField {
    fn of(self, token: &Token) -> usize {
        match self {
            UnitField::Paragraph => token.paragraph,
            UnitField::Sentence => token.sentence,
        }
    }
}

/// Resolve a unit plus context window into an ordered token view
pub fn resolve_window(tokens: &[Token], unit: TextUnit, context: &ContextUnit) -> UnitWindow {
    if tokens.is_empty() {
        return UnitWindow::default();
    }

    let primary = primary_range(tokens, unit);

    let context_range = match (unit, context.selected) {
        // a document unit always shows the whole document
        (TextUnit::Document, _) => full_range(tokens),
        (_, ContextScope::Document) => full_range(tokens),
        (_, ContextScope::None) => primary,
        (_, ContextScope::Paragraph) => widen(tokens, UnitField::Paragraph, context, primary),
        (_, ContextScope::Sentence) => widen(tokens, UnitField::Sentence, context, primary),
    };

    let mut windowed = Vec::new();
    for token in tokens {
        if token.index < context_range.0 {
            continue;
        }
        if token.index > context_range.1 {
            break;
        }
        let mut copy = token.clone();
        copy.text_part = if token.index < primary.0 {
            TextPart::ContextBefore
        } else if token.index > primary.1 {
            TextPart::ContextAfter
        } else {
            TextPart::TextUnit
        };
        copy.codable = token.codable && copy.text_part == TextPart::TextUnit;
        copy.array_index = windowed.len();
        windowed.push(copy);
    }

    UnitWindow {
        tokens: windowed,
        primary,
    }
}

fn full_range(tokens: &[Token]) -> TokenSpan {
    (tokens[0].index, tokens[tokens.len() - 1].index)
}

/// The primary token range of a unit descriptor
fn primary_range(tokens: &[Token], unit: TextUnit) -> TokenSpan {
    match unit {
        TextUnit::Document => full_range(tokens),
        TextUnit::Paragraph { index } => field_range(tokens, UnitField::Paragraph, index, index),
        TextUnit::Sentence { index } => field_range(tokens, UnitField::Sentence, index, index),
        TextUnit::Span { span } => {
            let last = tokens[tokens.len() - 1].index;
            (span.0.min(last), span.1.min(last))
        }
    }
}

/// Contiguous token range whose field value lies in [start_value, end_value].
///
/// The range runs from the first token with the start value to the token
/// immediately preceding the first token of `end_value + 1`; a unit at
/// the end of the document extends to the document end.
fn field_range(tokens: &[Token], field: UnitField, start_value: usize, end_value: usize) -> TokenSpan {
    let mut range = full_range(tokens);

    if let Some(start) = tokens.iter().find(|t| field.of(t) == start_value) {
        range.0 = start.index;
    }
    if let Some(end) = tokens.iter().find(|t| field.of(t) == end_value + 1) {
        range.1 = end.index.saturating_sub(1).max(range.0);
    }

    range
}

/// Translate the primary range into field coordinates, widen by the
/// context counts, and resolve back to token indices.
fn widen(
    tokens: &[Token],
    field: UnitField,
    context: &ContextUnit,
    primary: TokenSpan,
) -> TokenSpan {
    let offset = tokens[0].index;
    let first = &tokens[primary.0 - offset];
    let last = &tokens[primary.1 - offset];

    let (before, after) = context.selected_range();
    let start_value = field.of(first).saturating_sub(before);
    let end_value = field.of(last) + after;

    field_range(tokens, field, start_value, end_value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ContextScope;

    /// Two paragraphs: tokens 0-3 in paragraph 0, tokens 4-8 in paragraph 1
    fn two_paragraph_tokens() -> Vec<Token> {
        let mut tokens = Vec::new();
        for i in 0..9 {
            let paragraph = if i < 4 { 0 } else { 1 };
            let sentence = paragraph;
            let mut t = Token::new(i, i * 4, format!("t{}", i), paragraph, sentence);
            t.index = i;
            tokens.push(t);
        }
        tokens
    }

    #[test]
    fn test_document_unit_covers_everything() {
        let tokens = two_paragraph_tokens();
        let window = resolve_window(
            &tokens,
            TextUnit::Document,
            &ContextUnit::new(ContextScope::Document),
        );
        assert_eq!(window.primary, (0, 8));
        assert_eq!(window.tokens.len(), 9);
        assert!(window.tokens.iter().all(|t| t.text_part == TextPart::TextUnit));
        assert!(window.tokens.iter().all(|t| t.codable));
    }

    #[test]
    fn test_paragraph_unit_with_context_before() {
        // Scenario: unit = paragraph 1, context = 1 paragraph before, 0 after
        let tokens = two_paragraph_tokens();
        let mut context = ContextUnit::new(ContextScope::Paragraph);
        context.paragraph = (1, 0);

        let window = resolve_window(&tokens, TextUnit::Paragraph { index: 1 }, &context);

        assert_eq!(window.primary, (4, 8));
        assert_eq!(window.tokens.len(), 9);
        for t in &window.tokens {
            if t.index < 4 {
                assert_eq!(t.text_part, TextPart::ContextBefore);
                assert!(!t.codable);
            } else {
                assert_eq!(t.text_part, TextPart::TextUnit);
                assert!(t.codable);
            }
        }
    }

    #[test]
    fn test_zero_context_is_exact_slice() {
        let tokens = two_paragraph_tokens();
        let mut context = ContextUnit::new(ContextScope::Paragraph);
        context.paragraph = (0, 0);

        let window = resolve_window(&tokens, TextUnit::Paragraph { index: 0 }, &context);
        assert_eq!(window.primary, (0, 3));
        let indices: Vec<usize> = window.tokens.iter().map(|t| t.index).collect();
        assert_eq!(indices, vec![0, 1, 2, 3]);
        assert!(window.tokens.iter().all(|t| t.text_part == TextPart::TextUnit));
    }

    #[test]
    fn test_context_none_slices_primary() {
        let tokens = two_paragraph_tokens();
        let window = resolve_window(
            &tokens,
            TextUnit::Paragraph { index: 1 },
            &ContextUnit::new(ContextScope::None),
        );
        let indices: Vec<usize> = window.tokens.iter().map(|t| t.index).collect();
        assert_eq!(indices, vec![4, 5, 6, 7, 8]);
    }

    #[test]
    fn test_last_unit_extends_to_document_end() {
        let tokens = two_paragraph_tokens();
        let window = resolve_window(
            &tokens,
            TextUnit::Paragraph { index: 1 },
            &ContextUnit::new(ContextScope::None),
        );
        // paragraph 2 does not exist, so the range ends at the last token
        assert_eq!(window.primary, (4, 8));
    }

    #[test]
    fn test_span_unit_verbatim() {
        let tokens = two_paragraph_tokens();
        let window = resolve_window(
            &tokens,
            TextUnit::Span { span: (2, 5) },
            &ContextUnit::new(ContextScope::None),
        );
        assert_eq!(window.primary, (2, 5));
        let indices: Vec<usize> = window.tokens.iter().map(|t| t.index).collect();
        assert_eq!(indices, vec![2, 3, 4, 5]);
    }

    #[test]
    fn test_partition_iff_primary_range() {
        let tokens = two_paragraph_tokens();
        let mut context = ContextUnit::new(ContextScope::Paragraph);
        context.paragraph = (1, 1);
        let window = resolve_window(&tokens, TextUnit::Paragraph { index: 0 }, &context);

        for t in &window.tokens {
            let inside = window.primary.0 <= t.index && t.index <= window.primary.1;
            assert_eq!(t.text_part == TextPart::TextUnit, inside);
        }
    }

    #[test]
    fn test_array_index_rewritten() {
        let tokens = two_paragraph_tokens();
        let window = resolve_window(
            &tokens,
            TextUnit::Paragraph { index: 1 },
            &ContextUnit::new(ContextScope::None),
        );
        for (i, t) in window.tokens.iter().enumerate() {
            assert_eq!(t.array_index, i);
        }
        assert_eq!(window.absolute_index(0), Some(4));
        assert_eq!(window.array_index_of(6), Some(2));
        assert_eq!(window.array_index_of(0), None);
    }

    #[test]
    fn test_determinism() {
        let tokens = two_paragraph_tokens();
        let mut context = ContextUnit::new(ContextScope::Sentence);
        context.sentence = (1, 1);
        let unit = TextUnit::Sentence { index: 1 };
        let a = resolve_window(&tokens, unit, &context);
        let b = resolve_window(&tokens, unit, &context);
        assert_eq!(a, b);
    }

    #[test]
    fn test_empty_tokens() {
        let window = resolve_window(
            &[],
            TextUnit::Document,
            &ContextUnit::new(ContextScope::Document),
        );
        assert!(window.tokens.is_empty());
    }
}
