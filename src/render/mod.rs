//! Render adapter output shapes
//!
//! The render layer (JS) consumes plain data: per-token paint
//! instructions, popup rows and the annotations side-table. Everything
//! here is a read-only composition of the window, the annotation index
//! and the codebook; nothing in this module mutates state.

use serde::{Deserialize, Serialize};

use crate::color::{self, TokenColors};
use crate::index::AnnotationIndex;
use crate::models::{Codebook, TextPart, Token};
use crate::window::UnitWindow;

/// Paint instruction for one windowed token
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TokenPaint {
    pub array_index: usize,
    pub text: String,
    pub text_part: TextPart,
    pub codable: bool,
    /// Part of the in-progress selection
    pub selected: bool,
    /// First / last token of the selection (for CSS edge styling)
    pub selection_start: bool,
    pub selection_end: bool,
    /// Covered by at least one visible annotation
    pub annotated: bool,
    pub all_left: bool,
    pub any_left: bool,
    pub all_right: bool,
    pub any_right: bool,
    /// CSS colors for the three glyph thirds; None when unannotated
    pub pre: Option<String>,
    pub color: Option<String>,
    pub post: Option<String>,
}

/// One row of the annotation popup at a token
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PopupRow {
    pub variable: String,
    pub value: String,
    pub color: String,
}

/// One row of the annotations side-table (one per span)
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnnotationRow {
    pub offset: usize,
    pub variable: String,
    pub value: String,
    pub color: String,
    /// The annotated text, reconstructed from the covered tokens
    pub text: String,
}

/// Compose paint instructions for every token in the window.
///
/// `selection` is the normalized in-progress selection in window
/// indices, if any.
pub fn paint_tokens(
    window: &UnitWindow,
    index: &AnnotationIndex,
    codebook: &Codebook,
    selection: Option<(usize, usize)>,
) -> Vec<TokenPaint> {
    window
        .tokens
        .iter()
        .map(|token| paint_token(token, index, codebook, selection))
        .collect()
}

fn paint_token(
    token: &Token,
    index: &AnnotationIndex,
    codebook: &Codebook,
    selection: Option<(usize, usize)>,
) -> TokenPaint {
    let entries = index.query_token_filtered(token.index, codebook);

    let (selected, selection_start, selection_end) = match selection {
        Some((from, to)) if token.codable => (
            from <= token.array_index && token.array_index <= to,
            token.array_index == from,
            token.array_index == to,
        ),
        _ => (false, false, false),
    };

    let mut paint = TokenPaint {
        array_index: token.array_index,
        text: token.text.clone(),
        text_part: token.text_part,
        codable: token.codable,
        selected,
        selection_start: selected && selection_start,
        selection_end: selected && selection_end,
        annotated: false,
        all_left: false,
        any_left: false,
        all_right: false,
        any_right: false,
        pre: None,
        color: None,
        post: None,
    };

    if entries.is_empty() {
        return paint;
    }

    let TokenColors {
        pre,
        text,
        post,
        all_left,
        any_left,
        all_right,
        any_right,
    } = color::token_colors(&entries, codebook);

    paint.annotated = true;
    paint.all_left = all_left;
    paint.any_left = any_left;
    paint.all_right = all_right;
    paint.any_right = any_right;
    paint.pre = Some(pre.css());
    paint.color = Some(text.css());
    paint.post = Some(post.css());
    paint
}

/// Rows for the annotation popup at an absolute token index,
/// codebook-filtered
pub fn popup_rows(
    index: &AnnotationIndex,
    codebook: &Codebook,
    token_index: usize,
) -> Vec<PopupRow> {
    index
        .query_token_filtered(token_index, codebook)
        .into_iter()
        .map(|entry| PopupRow {
            variable: entry.variable.clone(),
            value: entry.value.clone(),
            color: color::color_of(&entry.variable, &entry.value, codebook).css(),
        })
        .collect()
}

/// The annotations side-table: one row per visible span, in token order
pub fn annotation_rows(
    index: &AnnotationIndex,
    codebook: &Codebook,
    tokens: &[Token],
) -> Vec<AnnotationRow> {
    index
        .spans()
        .filter(|entry| codebook.is_active(&entry.variable, &entry.value))
        .filter_map(|entry| {
            let (start, end) = entry.span;
            let first = tokens.get(start)?;
            let covered: Vec<&str> = tokens
                .get(start..=end)?
                .iter()
                .map(|t| t.text.as_str())
                .collect();
            Some(AnnotationRow {
                offset: first.offset,
                variable: entry.variable.clone(),
                value: entry.value.clone(),
                color: color::color_of(&entry.variable, &entry.value, codebook).css(),
                text: covered.join(" "),
            })
        })
        .collect()
}
