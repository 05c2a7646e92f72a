//! Client for the hosted completion and image-generation APIs.
//!
//! The study, math and vision features only see the [`CompletionProvider`]
//! and [`ImageProvider`] traits, so tests can swap in scripted fakes.

pub mod client;
pub mod error;
pub mod models;
#[cfg(test)]
pub(crate) mod testing;

pub use client::{CompletionProvider, ImageProvider, OpenAiClient};
pub use error::AiError;
pub use models::*;
