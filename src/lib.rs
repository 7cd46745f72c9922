//! Span Annotation Engine WASM Module
//!
//! This is the main WASM module for the span annotation engine. It
//! provides the core data structures and algorithms for assigning
//! categorical codes to token spans inside documents: tokenization,
//! the token-expanded annotation index, unit/context window resolution,
//! the selection state machine and deterministic code colors.

pub mod models;
pub mod tokenize;
pub mod errors;
pub mod index;
pub mod window;
pub mod select;
pub mod color;
pub mod render;
pub mod settings;
pub mod api;

// Re-export commonly used types
pub use errors::AnnotateError;
pub use index::AnnotationIndex;
pub use models::*;
pub use select::{InputEvent, Outcome, PopupChoice, SelectionMachine};
pub use window::{resolve_window, UnitWindow};

use wasm_bindgen::prelude::*;

// This is like the `main` function, but for WASM modules.
#[wasm_bindgen(start)]
pub fn main() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
    #[cfg(feature = "console_log")]
    console_log::init_with_level(log::Level::Debug).expect("failed to initialize logger");

    log::info!("Span Annotation Engine WASM module initialized");
}
