//! Study artifact synthesis from uploaded documents.
//!
//! Text is normalized, cut into fixed-size chunks and sent to the
//! completion API one chunk at a time; the per-chunk flashcards and quiz
//! items are concatenated into a single bundle.

pub mod chunker;
pub mod models;
pub mod prompts;
pub mod synthesizer;

pub use chunker::{chunk_text, normalize_text};
pub use models::*;
pub use synthesizer::{SynthesisError, Synthesizer};
