//! Span Annotation Engine WASM API
//!
//! This module provides the JavaScript-facing API for the annotation
//! engine. It includes shared utilities for serialization, validation,
//! and error handling, as well as the core API functions.
//!
//! # Module Structure
//!
//! - `helpers`: Shared utilities for serialization, validation, error
//!   handling, and logging
//! - `core`: Engine API functions (document lifecycle, unit resolution,
//!   gestures, render views, settings)

pub mod helpers;
pub mod core;

// Re-export all public functions to keep a flat public API
pub use core::*;
