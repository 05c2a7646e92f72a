//! Text normalization and fixed-size chunking for synthesis.
//!
//! Chunks are plain sequential slices: no overlap and no sentence or
//! paragraph alignment, so concatenating them gives back the input exactly.

use std::num::NonZeroUsize;

/// Strip NUL and other control characters, keeping newlines, carriage
/// returns and tabs.
pub fn normalize_text(text: &str) -> String {
    text.chars()
        .filter(|&c| !c.is_control() || matches!(c, '\n' | '\r' | '\t'))
        .collect()
}

/// Split text into ordered slices of at most `max_chars` characters.
///
/// Counts Unicode scalar values, never splitting inside a character.
/// Empty input yields no chunks.
pub fn chunk_text(text: &str, max_chars: NonZeroUsize) -> Vec<&str> {
    let max_chars = max_chars.get();
    let mut chunks = Vec::new();
    let mut start = 0;
    let mut count = 0;

    for (idx, _) in text.char_indices() {
        if count == max_chars {
            chunks.push(&text[start..idx]);
            start = idx;
            count = 0;
        }
        count += 1;
    }

    if start < text.len() {
        chunks.push(&text[start..]);
    }

    chunks
}
