//! Chunked synthesis of flashcards, quiz items and a concept map.
//!
//! One completion request per chunk. A failed or unreadable chunk becomes a
//! notice and the loop moves on; only a missing API key stops the run.

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::ai::{AiError, ChatMessage, CompletionProvider, CompletionRequest};
use crate::config::ModelConfig;

use super::chunker::{chunk_text, normalize_text};
use super::models::{
    ChunkNotice, Flashcard, NoticeKind, QuizItem, StudyArtifactBundle, SynthesisOptions,
    SynthesisProgress, SynthesisReport,
};
use super::prompts::{chunk_instruction, SYNTHESIS_SYSTEM_PROMPT};

#[derive(Error, Debug)]
pub enum SynthesisError {
    #[error("No API key configured (set OPENAI_API_KEY or api_key in config.toml)")]
    MissingCredentials,

    #[error("No content produced from {chunks} chunk(s)")]
    NoContentProduced {
        chunks: usize,
        notices: Vec<ChunkNotice>,
    },
}

/// Shape the model is asked to return for each chunk
#[derive(Debug, Default, Deserialize)]
struct ChunkPayload {
    #[serde(default, alias = "flashcards")]
    cards: Vec<WireCard>,
    #[serde(default, alias = "questions")]
    quiz: Vec<WireQuiz>,
    #[serde(default, alias = "concept_map")]
    map: Option<Value>,
    #[serde(default, alias = "vision_prompt")]
    vision: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireCard {
    #[serde(alias = "question", alias = "front")]
    q: String,
    #[serde(alias = "answer", alias = "back")]
    a: String,
}

#[derive(Debug, Deserialize)]
struct WireQuiz {
    #[serde(alias = "question")]
    q: String,
    #[serde(default, alias = "options")]
    o: Vec<String>,
    #[serde(alias = "answer", alias = "correct")]
    a: Value,
}

impl WireQuiz {
    fn into_item(self) -> QuizItem {
        // Some models answer with the option index instead of its text
        let answer = match self.a {
            Value::String(s) => s,
            Value::Number(n) => n
                .as_u64()
                .and_then(|i| self.o.get(i as usize).cloned())
                .unwrap_or_else(|| n.to_string()),
            other => other.to_string(),
        };
        QuizItem {
            question: self.q,
            options: self.o,
            answer,
        }
    }
}

/// Runs the per-chunk loop against a completion provider
pub struct Synthesizer<'a, P: CompletionProvider + ?Sized> {
    provider: &'a P,
    models: &'a ModelConfig,
}

enum ChunkFailure {
    Request(AiError),
    Malformed(String),
}

impl<'a, P: CompletionProvider + ?Sized> Synthesizer<'a, P> {
    pub fn new(provider: &'a P, models: &'a ModelConfig) -> Self {
        Self { provider, models }
    }

    /// Synthesize a bundle from raw document text.
    ///
    /// `on_progress` is called after every chunk, including skipped and
    /// failed ones.
    pub fn synthesize<F>(
        &self,
        text: &str,
        options: &SynthesisOptions,
        mut on_progress: F,
    ) -> Result<SynthesisReport, SynthesisError>
    where
        F: FnMut(SynthesisProgress),
    {
        let normalized = normalize_text(text);
        let chunks = chunk_text(&normalized, options.chunk_size);
        let total = chunks.len();
        let model = self.models.for_mode(options.mode);
        let temperature = options.temperature();

        log::info!(
            "Synthesizing {} chars in {} chunk(s) with {}",
            normalized.chars().count(),
            total,
            model
        );

        let mut bundle = StudyArtifactBundle::default();
        let mut notices = Vec::new();
        let mut succeeded = 0;

        for (index, chunk) in chunks.iter().enumerate() {
            let first = index == 0;

            let outcome = if chunk.trim().is_empty() {
                Err(NoticeKind::Blank)
            } else {
                match self.request_chunk(chunk, index, total, first, model, temperature) {
                    Ok(payload) => Ok(payload),
                    Err(ChunkFailure::Request(e)) if e.is_credential_error() => {
                        return Err(SynthesisError::MissingCredentials);
                    }
                    Err(ChunkFailure::Request(e)) => Err(NoticeKind::RequestFailed(e.to_string())),
                    Err(ChunkFailure::Malformed(e)) => Err(NoticeKind::Malformed(e)),
                }
            };

            match outcome {
                Ok(payload) => {
                    succeeded += 1;
                    merge_payload(&mut bundle, payload, first);
                }
                Err(kind) => {
                    let notice = ChunkNotice {
                        chunk_index: index,
                        kind,
                    };
                    log::warn!("{}", notice);
                    notices.push(notice);
                }
            }

            on_progress(SynthesisProgress {
                completed: index + 1,
                total,
            });
        }

        if bundle.is_empty() {
            return Err(SynthesisError::NoContentProduced {
                chunks: total,
                notices,
            });
        }

        log::info!(
            "Synthesis produced {} flashcard(s), {} quiz item(s) from {}/{} chunk(s)",
            bundle.flashcards.len(),
            bundle.quiz.len(),
            succeeded,
            total
        );

        Ok(SynthesisReport {
            bundle,
            notices,
            chunks_total: total,
            chunks_succeeded: succeeded,
        })
    }

    fn request_chunk(
        &self,
        chunk: &str,
        index: usize,
        total: usize,
        first: bool,
        model: &str,
        temperature: f64,
    ) -> Result<ChunkPayload, ChunkFailure> {
        let request = CompletionRequest::new(
            model,
            vec![
                ChatMessage::system(SYNTHESIS_SYSTEM_PROMPT),
                ChatMessage::user(chunk_instruction(chunk, index, total, first)),
            ],
        )
        .with_temperature(temperature)
        .with_json_response();

        let completion = self
            .provider
            .complete(&request)
            .map_err(ChunkFailure::Request)?;

        parse_chunk_payload(&completion.content).map_err(ChunkFailure::Malformed)
    }
}

/// Append a chunk's cards and quiz items. Map and vision are only taken
/// from the first chunk.
fn merge_payload(bundle: &mut StudyArtifactBundle, payload: ChunkPayload, first: bool) {
    bundle.flashcards.extend(
        payload
            .cards
            .into_iter()
            .filter(|c| !c.q.trim().is_empty() && !c.a.trim().is_empty())
            .map(|c| Flashcard {
                question: c.q.trim().to_string(),
                answer: c.a.trim().to_string(),
            }),
    );
    bundle.quiz.extend(
        payload
            .quiz
            .into_iter()
            .filter(|item| !item.q.trim().is_empty())
            .map(WireQuiz::into_item),
    );

    if first {
        bundle.concept_map = payload.map.and_then(|map| match map {
            Value::Null => None,
            Value::String(s) if s.trim().is_empty() => None,
            Value::String(s) => Some(s),
            other => serde_json::to_string_pretty(&other).ok(),
        });
        bundle.vision_prompt = payload.vision.filter(|v| !v.trim().is_empty());
    }
}

/// Parse the model output, tolerating markdown fences and stray prose
/// around the JSON object.
fn parse_chunk_payload(content: &str) -> Result<ChunkPayload, String> {
    let trimmed = extract_json(content);

    match serde_json::from_str::<ChunkPayload>(trimmed) {
        Ok(payload) => Ok(payload),
        Err(first_err) => {
            let start = trimmed.find('{');
            let end = trimmed.rfind('}');
            match (start, end) {
                (Some(s), Some(e)) if s < e => serde_json::from_str(&trimmed[s..=e])
                    .map_err(|e| e.to_string()),
                _ => Err(first_err.to_string()),
            }
        }
    }
}

/// JSON body of a reply that may wrap it in a markdown code block,
/// possibly after some leading prose.
fn extract_json(text: &str) -> &str {
    let text = text.trim();

    if let Some(start) = text.find("```") {
        let body = &text[start + 3..];
        // ```json or a bare ```
        let body = body.strip_prefix("json").unwrap_or(body);
        if let Some(end) = body.find("```") {
            return body[..end].trim();
        }
    }

    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::testing::ScriptedProvider;
    use crate::study::models::ProcessingMode;
    use std::num::NonZeroUsize;

    fn options(chunk_size: usize) -> SynthesisOptions {
        SynthesisOptions {
            creativity: 0.4,
            mode: ProcessingMode::Fast,
            chunk_size: NonZeroUsize::new(chunk_size).unwrap(),
        }
    }

    fn cards_json(prefix: &str, n: usize) -> String {
        let cards: Vec<Value> = (0..n)
            .map(|i| serde_json::json!({"q": format!("{} Q{}", prefix, i), "a": "A"}))
            .collect();
        serde_json::json!({"cards": cards, "quiz": []}).to_string()
    }

    #[test]
    fn test_empty_input_makes_no_calls() {
        let provider = ScriptedProvider::new();
        let models = ModelConfig::default();
        let mut progress = Vec::new();

        let result = Synthesizer::new(&provider, &models).synthesize("", &options(100), |p| {
            progress.push(p)
        });

        match result {
            Err(SynthesisError::NoContentProduced { chunks, notices }) => {
                assert_eq!(chunks, 0);
                assert!(notices.is_empty());
            }
            other => panic!("expected NoContentProduced, got {:?}", other),
        }
        assert_eq!(provider.request_count(), 0);
        assert!(progress.is_empty());
    }

    #[test]
    fn test_aggregates_across_chunks_with_failures() {
        let provider = ScriptedProvider::new()
            .reply(cards_json("c1", 3))
            .fail(AiError::RateLimited)
            .reply("this is not json")
            .reply(cards_json("c4", 2));
        let models = ModelConfig::default();
        let text = "x".repeat(40);
        let mut progress = Vec::new();

        let report = Synthesizer::new(&provider, &models)
            .synthesize(&text, &options(10), |p| progress.push(p.fraction()))
            .unwrap();

        assert_eq!(report.bundle.flashcards.len(), 3 + 0 + 0 + 2);
        assert_eq!(report.chunks_total, 4);
        assert_eq!(report.chunks_succeeded, 2);
        assert_eq!(report.notices.len(), 2);
        assert!(matches!(report.notices[0].kind, NoticeKind::RequestFailed(_)));
        assert_eq!(report.notices[0].chunk_index, 1);
        assert!(matches!(report.notices[1].kind, NoticeKind::Malformed(_)));
        assert_eq!(progress, vec![0.25, 0.5, 0.75, 1.0]);
        assert_eq!(report.bundle.flashcards[3].question, "c4 Q0");
    }

    #[test]
    fn test_requests_use_mode_model_and_json_format() {
        let provider = ScriptedProvider::new().reply(cards_json("a", 1)).reply(cards_json("b", 1));
        let models = ModelConfig::default();

        Synthesizer::new(&provider, &models)
            .synthesize(&"y".repeat(15), &options(10), |_| {})
            .unwrap();

        let requests = provider.requests.borrow();
        assert_eq!(requests.len(), 2);
        for request in requests.iter() {
            assert_eq!(request.model, "gpt-4o-mini");
            assert_eq!(request.temperature, Some(0.4));
            assert!(request.json_response);
        }
        assert!(requests[0].messages[1].content.as_text().contains("\"map\""));
        assert!(!requests[1].messages[1].content.as_text().contains("\"map\""));
    }

    #[test]
    fn test_first_chunk_wins_for_map_and_vision() {
        let first = r#"{"cards": [{"q": "Q1", "a": "A1"}], "quiz": [], "map": "Cell\n  Nucleus", "vision": "A glowing cell"}"#;
        let second = r#"{"cards": [{"q": "Q2", "a": "A2"}], "quiz": [], "map": "Other", "vision": "Other"}"#;
        let provider = ScriptedProvider::new().reply(first).reply(second);
        let models = ModelConfig::default();

        let report = Synthesizer::new(&provider, &models)
            .synthesize(&"z".repeat(20), &options(10), |_| {})
            .unwrap();

        assert_eq!(report.bundle.concept_map.as_deref(), Some("Cell\n  Nucleus"));
        assert_eq!(report.bundle.vision_prompt.as_deref(), Some("A glowing cell"));
        assert_eq!(report.bundle.flashcards.len(), 2);
    }

    #[test]
    fn test_failed_first_chunk_leaves_map_empty() {
        let second = r#"{"cards": [{"q": "Q2", "a": "A2"}], "map": "late map", "vision": "late"}"#;
        let provider = ScriptedProvider::new()
            .fail(AiError::Api { status: 500, message: "boom".into() })
            .reply(second);
        let models = ModelConfig::default();

        let report = Synthesizer::new(&provider, &models)
            .synthesize(&"z".repeat(20), &options(10), |_| {})
            .unwrap();

        assert!(report.bundle.concept_map.is_none());
        assert!(report.bundle.vision_prompt.is_none());
        assert_eq!(report.bundle.flashcards.len(), 1);
    }

    #[test]
    fn test_blank_chunk_skipped_without_request() {
        let provider = ScriptedProvider::new().reply(cards_json("a", 1));
        let models = ModelConfig::default();
        let text = format!("{}{}", "notes here", " ".repeat(10));

        let report = Synthesizer::new(&provider, &models)
            .synthesize(&text, &options(10), |_| {})
            .unwrap();

        assert_eq!(provider.request_count(), 1);
        assert_eq!(report.notices, vec![ChunkNotice { chunk_index: 1, kind: NoticeKind::Blank }]);
    }

    #[test]
    fn test_all_chunks_failing_is_no_content() {
        let provider = ScriptedProvider::new()
            .fail(AiError::RateLimited)
            .reply("{oops");
        let models = ModelConfig::default();

        let result = Synthesizer::new(&provider, &models).synthesize(
            &"w".repeat(20),
            &options(10),
            |_| {},
        );

        match result {
            Err(SynthesisError::NoContentProduced { chunks, notices }) => {
                assert_eq!(chunks, 2);
                assert_eq!(notices.len(), 2);
            }
            other => panic!("expected NoContentProduced, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_credentials_aborts() {
        let provider = ScriptedProvider::new()
            .fail(AiError::MissingCredentials)
            .reply(cards_json("never", 1));
        let models = ModelConfig::default();

        let result = Synthesizer::new(&provider, &models).synthesize(
            &"v".repeat(20),
            &options(10),
            |_| {},
        );

        assert!(matches!(result, Err(SynthesisError::MissingCredentials)));
        assert_eq!(provider.request_count(), 1);
    }

    #[test]
    fn test_control_bytes_stripped_before_chunking() {
        let provider = ScriptedProvider::new().reply(cards_json("a", 1));
        let models = ModelConfig::default();

        let report = Synthesizer::new(&provider, &models)
            .synthesize("abc\0\0\0\0\0def", &options(6), |_| {})
            .unwrap();

        assert_eq!(report.chunks_total, 1);
        assert!(provider.requests.borrow()[0].messages[1]
            .content
            .as_text()
            .contains("abcdef"));
    }

    #[test]
    fn test_extract_json_fences() {
        let plain = r#"{"cards": []}"#;
        assert_eq!(extract_json(plain), plain);
        assert_eq!(extract_json("```json\n{\"cards\": []}\n```"), plain);
        assert_eq!(extract_json("```\n{\"cards\": []}\n```"), plain);
        assert_eq!(
            extract_json("Sure, here it is:\n```json\n{\"cards\": []}\n```\nAnything else?"),
            plain
        );
    }

    #[test]
    fn test_parse_payload_variants() {
        let fenced = "```json\n{\"cards\": [{\"q\": \"Q\", \"a\": \"A\"}]}\n```";
        assert_eq!(parse_chunk_payload(fenced).unwrap().cards.len(), 1);

        let chatty = "Sure! Here you go: {\"flashcards\": [{\"question\": \"Q\", \"answer\": \"A\"}]} Enjoy.";
        assert_eq!(parse_chunk_payload(chatty).unwrap().cards.len(), 1);

        let prose_then_fence =
            "Here are the cards:\n```\n{\"cards\": [{\"q\": \"Q\", \"a\": \"A\"}]}\n```\nGood luck!";
        assert_eq!(parse_chunk_payload(prose_then_fence).unwrap().cards.len(), 1);

        assert!(parse_chunk_payload("no json at all").is_err());
        assert!(parse_chunk_payload("{\"cards\": [{\"q\": 1}]}").is_err());
    }

    #[test]
    fn test_quiz_answer_index_resolves_to_option() {
        let payload = parse_chunk_payload(
            r#"{"quiz": [{"q": "2+2?", "o": ["3", "4"], "a": 1}, {"q": "Sky?", "o": ["blue"], "a": "blue"}]}"#,
        )
        .unwrap();
        let items: Vec<QuizItem> = payload.quiz.into_iter().map(WireQuiz::into_item).collect();
        assert_eq!(items[0].answer, "4");
        assert_eq!(items[1].answer, "blue");
    }

    #[test]
    fn test_blank_cards_dropped_and_no_dedup() {
        let mut bundle = StudyArtifactBundle::default();
        let payload = parse_chunk_payload(
            r#"{"cards": [{"q": "Q", "a": "A"}, {"q": " ", "a": "A"}, {"q": "Q", "a": "A"}]}"#,
        )
        .unwrap();
        merge_payload(&mut bundle, payload, false);
        assert_eq!(bundle.flashcards.len(), 2);
    }
}
