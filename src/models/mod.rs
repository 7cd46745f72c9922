//! Models module for the Span Annotation Engine
//!
//! This module contains all the data models and structures
//! used in the token-based span annotation system.

pub mod token;
pub mod annotation;
pub mod codebook;
pub mod unit;
pub mod engine_state;

// Re-export commonly used types
pub use token::*;
pub use annotation::*;
pub use codebook::*;
pub use unit::*;
pub use engine_state::EngineState;
