//! Prompt text for the study features.

pub const SYNTHESIS_SYSTEM_PROMPT: &str = "You turn study notes into review material. \
Respond with a single JSON object and nothing else. \
Base every item strictly on the provided notes.";

const CARD_QUIZ_SHAPE: &str = r#"{"cards": [{"q": "question", "a": "answer"}], "quiz": [{"q": "question", "o": ["option A", "option B", "option C", "option D"], "a": "the correct option, copied exactly"}]}"#;

const FIRST_CHUNK_SHAPE: &str = r#"{"cards": [{"q": "question", "a": "answer"}], "quiz": [{"q": "question", "o": ["option A", "option B", "option C", "option D"], "a": "the correct option, copied exactly"}], "map": "a concept map of the main ideas as an indented outline", "vision": "a one-sentence prompt for an illustration of the topic"}"#;

/// Instruction for one chunk. The first chunk also asks for the concept map
/// and vision prompt.
pub fn chunk_instruction(chunk: &str, index: usize, total: usize, first: bool) -> String {
    let shape = if first { FIRST_CHUNK_SHAPE } else { CARD_QUIZ_SHAPE };
    format!(
        "Notes (part {} of {}):\n\"\"\"\n{}\n\"\"\"\n\n\
         Create flashcards and multiple-choice quiz questions covering these notes.\n\
         Return JSON with exactly this shape:\n{}",
        index + 1,
        total,
        chunk,
        shape
    )
}
