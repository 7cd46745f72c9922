//! Error taxonomy for the annotation engine
//!
//! None of these are fatal: malformed annotations are dropped with a
//! warning, unknown codes are hidden but never deleted, invalid
//! selections are refused silently, and a stale context forces a reset.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnnotateError {
    /// Annotation character range does not cover any token
    #[error("malformed annotation at offset {offset} (length {length}): no covering tokens")]
    MalformedAnnotation { offset: usize, length: usize },

    /// Variable/value pair not present in the active codebook
    #[error("unknown code '{value}' for variable '{variable}'")]
    UnknownCode { variable: String, value: String },

    /// Empty selection, or a selection spanning non-codable tokens
    #[error("invalid selection")]
    InvalidSelection,

    /// Document changed while a gesture was in progress
    #[error("document changed during gesture")]
    StaleContext,
}
