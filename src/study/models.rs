//! Data models for document synthesis.

use std::fmt;
use std::num::NonZeroUsize;

use serde::{Deserialize, Serialize};

/// Default maximum characters per chunk
pub const DEFAULT_CHUNK_SIZE: usize = 6000;

/// Model tier used for synthesis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProcessingMode {
    /// Larger, slower model
    #[default]
    HighFidelity,
    /// Smaller, faster model
    Fast,
}

/// A generated question/answer pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Flashcard {
    pub question: String,
    pub answer: String,
}

/// A generated multiple-choice question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizItem {
    pub question: String,
    pub options: Vec<String>,
    pub answer: String,
}

/// Everything one synthesis run produced
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyArtifactBundle {
    pub flashcards: Vec<Flashcard>,
    pub quiz: Vec<QuizItem>,
    /// Concept map from the first chunk only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub concept_map: Option<String>,
    /// Image prompt from the first chunk only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vision_prompt: Option<String>,
}

impl StudyArtifactBundle {
    pub fn is_empty(&self) -> bool {
        self.flashcards.is_empty()
            && self.quiz.is_empty()
            && self.concept_map.is_none()
            && self.vision_prompt.is_none()
    }
}

/// Options for one synthesis run
#[derive(Debug, Clone, Copy)]
pub struct SynthesisOptions {
    /// Output randomness, clamped to 0.0 - 1.0
    pub creativity: f64,
    pub mode: ProcessingMode,
    pub chunk_size: NonZeroUsize,
}

impl Default for SynthesisOptions {
    fn default() -> Self {
        Self {
            creativity: 0.7,
            mode: ProcessingMode::default(),
            chunk_size: NonZeroUsize::new(DEFAULT_CHUNK_SIZE).unwrap_or(NonZeroUsize::MIN),
        }
    }
}

impl SynthesisOptions {
    pub fn temperature(&self) -> f64 {
        if self.creativity.is_nan() {
            return 0.0;
        }
        self.creativity.clamp(0.0, 1.0)
    }
}

/// Progress after each chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SynthesisProgress {
    pub completed: usize,
    pub total: usize,
}

impl SynthesisProgress {
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.completed as f64 / self.total as f64
        }
    }
}

/// Why a chunk contributed nothing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "camelCase")]
pub enum NoticeKind {
    /// Whitespace-only chunk, no request made
    Blank,
    RequestFailed(String),
    Malformed(String),
}

/// Per-chunk soft failure surfaced to the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkNotice {
    pub chunk_index: usize,
    pub kind: NoticeKind,
}

impl fmt::Display for ChunkNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let n = self.chunk_index + 1;
        match &self.kind {
            NoticeKind::Blank => write!(f, "chunk {} is blank, skipped", n),
            NoticeKind::RequestFailed(e) => write!(f, "chunk {} request failed: {}", n, e),
            NoticeKind::Malformed(e) => write!(f, "chunk {} returned unreadable output: {}", n, e),
        }
    }
}

/// Result of a synthesis run that produced content
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SynthesisReport {
    pub bundle: StudyArtifactBundle,
    pub notices: Vec<ChunkNotice>,
    pub chunks_total: usize,
    pub chunks_succeeded: usize,
}
