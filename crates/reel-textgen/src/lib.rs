//! Overlay text generation.
//!
//! This crate provides:
//! - The `TextVariationGenerator` capability (Gemini HTTP implementation)
//! - The overlay resolver: strategy + inputs -> exactly N overlay strings,
//!   with bounded retries and a deterministic fallback

pub mod error;
pub mod generator;
pub mod resolver;

pub use error::{TextGenError, TextGenResult};
pub use generator::{GeminiConfig, GeminiGenerator, TextVariationGenerator};
pub use resolver::resolve_overlays;
