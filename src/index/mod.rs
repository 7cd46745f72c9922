//! Annotation index: token-expanded view of the annotation set
//!
//! The index is the single source of truth mutated by commits. Raw
//! offset-based annotations are expanded so that every covered token
//! carries one `SpanEntry` per covering span, which makes per-token
//! lookup O(1) amortized and boundary checks trivial.
//!
//! Edits follow remove-then-add semantics: a span is never patched in
//! place across a token boundary, the whole old span is removed first.

use std::collections::BTreeMap;

use crate::errors::AnnotateError;
use crate::models::{AnnotationId, RawAnnotation, SpanEntry, Token, TokenSpan};
use crate::models::Codebook;

/// Token-expanded annotation index: token index -> (id -> entry)
#[derive(Clone, Debug, Default)]
pub struct AnnotationIndex {
    entries: BTreeMap<usize, BTreeMap<AnnotationId, SpanEntry>>,
    next_id: u64,
}

// Two indices are equal when they hold the same entries; the id counter
// is bookkeeping and excluded so add-then-remove restores equality.
impl PartialEq for AnnotationIndex {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl AnnotationIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an index from persisted annotations.
    ///
    /// Annotations whose character range covers no token are dropped
    /// with a warning and reported back; they never block the rest.
    pub fn build(raw: &[RawAnnotation], tokens: &[Token]) -> (Self, Vec<AnnotateError>) {
        let mut index = Self::new();
        let mut dropped = Vec::new();

        for annotation in raw {
            match resolve_char_span(annotation, tokens) {
                Some(span) => {
                    index.add_span(span, &annotation.variable, &annotation.value);
                }
                None => {
                    let err = AnnotateError::MalformedAnnotation {
                        offset: annotation.offset,
                        length: annotation.length,
                    };
                    log::warn!("dropping annotation: {}", err);
                    dropped.push(err);
                }
            }
        }

        (index, dropped)
    }

    /// Insert a fresh span over an inclusive token range.
    ///
    /// Returns the newly issued id. Entries are written for every token
    /// in the range, each knowing its own position within the span.
    pub fn add_span(&mut self, span: TokenSpan, variable: &str, value: &str) -> AnnotationId {
        let id = AnnotationId(self.next_id);
        self.next_id += 1;

        let (start, end) = normalize(span);
        for token_index in start..=end {
            self.entries.entry(token_index).or_default().insert(
                id,
                SpanEntry {
                    id,
                    variable: variable.to_string(),
                    value: value.to_string(),
                    span: (start, end),
                    index: token_index,
                },
            );
        }
        id
    }

    /// Remove every entry with the given id. No-op if the id is absent.
    pub fn remove_span(&mut self, id: AnnotationId) {
        self.entries.retain(|_, at_token| {
            at_token.remove(&id);
            !at_token.is_empty()
        });
    }

    /// All entries covering a token, in stable id (insertion) order
    pub fn query_token(&self, token_index: usize) -> Vec<&SpanEntry> {
        self.entries
            .get(&token_index)
            .map(|at_token| at_token.values().collect())
            .unwrap_or_default()
    }

    /// Lightweight check: does any span start or end at this token?
    pub fn has_boundary(&self, token_index: usize) -> bool {
        self.query_token(token_index)
            .iter()
            .any(|e| e.is_left_boundary() || e.is_right_boundary())
    }

    /// Whether any entry covers this token
    pub fn is_annotated(&self, token_index: usize) -> bool {
        self.entries
            .get(&token_index)
            .map(|at_token| !at_token.is_empty())
            .unwrap_or(false)
    }

    /// Read-time view: entries at a token that the active codebook allows.
    ///
    /// Filtering never mutates the index; deactivating codes in the
    /// codebook must be reversible without data loss.
    pub fn query_token_filtered(
        &self,
        token_index: usize,
        codebook: &Codebook,
    ) -> Vec<&SpanEntry> {
        self.query_token(token_index)
            .into_iter()
            .filter(|e| codebook.is_active(&e.variable, &e.value))
            .collect()
    }

    /// Collapse spans back to offset/length form for persistence.
    ///
    /// `tokens` must be the full document token stream (token `index`
    /// equals position). Output is ordered by (offset, id).
    pub fn to_raw(&self, tokens: &[Token]) -> Vec<RawAnnotation> {
        let mut raw = Vec::new();
        for at_token in self.entries.values() {
            for entry in at_token.values() {
                if !entry.is_left_boundary() {
                    continue;
                }
                let (start, end) = entry.span;
                let (Some(first), Some(last)) = (tokens.get(start), tokens.get(end)) else {
                    continue;
                };
                raw.push((
                    entry.id,
                    RawAnnotation {
                        offset: first.offset,
                        length: last.end_offset() - first.offset,
                        variable: entry.variable.clone(),
                        value: entry.value.clone(),
                    },
                ));
            }
        }
        raw.sort_by(|(id_a, a), (id_b, b)| (a.offset, *id_a).cmp(&(b.offset, *id_b)));
        raw.into_iter().map(|(_, annotation)| annotation).collect()
    }

    /// Number of distinct spans in the index
    pub fn span_count(&self) -> usize {
        let mut ids: Vec<AnnotationId> = self
            .entries
            .values()
            .flat_map(|at_token| at_token.keys().copied())
            .collect();
        ids.sort_unstable();
        ids.dedup();
        ids.len()
    }

    /// Iterate left-boundary entries in token order (one per span)
    pub fn spans(&self) -> impl Iterator<Item = &SpanEntry> {
        self.entries
            .values()
            .flat_map(|at_token| at_token.values())
            .filter(|e| e.is_left_boundary())
    }
}

fn normalize(span: TokenSpan) -> TokenSpan {
    if span.0 <= span.1 {
        span
    } else {
        (span.1, span.0)
    }
}

/// Locate the inclusive token span bracketing a character range.
///
/// A token is covered when its character range overlaps
/// `[offset, offset + length)`. Returns None when no token overlaps
/// (out-of-bounds or stale annotation referencing removed text).
fn resolve_char_span(annotation: &RawAnnotation, tokens: &[Token]) -> Option<TokenSpan> {
    if annotation.length == 0 {
        return None;
    }
    let start_char = annotation.offset;
    let end_char = annotation.end_offset();

    let mut first: Option<usize> = None;
    let mut last: Option<usize> = None;
    for token in tokens {
        if token.end_offset() <= start_char {
            continue;
        }
        if token.offset >= end_char {
            break;
        }
        if first.is_none() {
            first = Some(token.index);
        }
        last = Some(token.index);
    }
    Some((first?, last?))
}
