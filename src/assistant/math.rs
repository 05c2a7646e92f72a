//! Step-by-step math solver chat.

use std::fs;
use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::ai::{AiError, ChatMessage, CompletionProvider, CompletionRequest};

const MATH_SYSTEM_PROMPT: &str = "You are a patient math tutor. Solve problems step by step, \
numbering each step and ending with the final answer on its own line. \
Use plain text formatting and avoid complex LaTeX.";

/// Question used when only an image is supplied
const DEFAULT_IMAGE_QUESTION: &str = "Solve this problem.";

/// An image of a problem, sent inline as a data URL
#[derive(Debug, Clone)]
pub struct ImageAttachment {
    pub mime_type: String,
    pub data: Vec<u8>,
}

impl ImageAttachment {
    pub fn from_path(path: &Path) -> Result<Self, AiError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();
        let mime_type = match ext.as_str() {
            "png" => "image/png",
            "jpg" | "jpeg" => "image/jpeg",
            "gif" => "image/gif",
            "webp" => "image/webp",
            _ => {
                return Err(AiError::InvalidRequest(format!(
                    "unsupported image type: {}",
                    path.display()
                )))
            }
        };
        let data = fs::read(path).map_err(|e| {
            AiError::InvalidRequest(format!("could not read {}: {}", path.display(), e))
        })?;

        Ok(Self {
            mime_type: mime_type.to_string(),
            data,
        })
    }

    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, STANDARD.encode(&self.data))
    }
}

/// Conversation with the math solver.
///
/// Images are sent only with the turn they belong to; the history keeps the
/// text of each turn.
pub struct MathTutor {
    model: String,
    history: Vec<ChatMessage>,
}

impl MathTutor {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            history: vec![ChatMessage::system(MATH_SYSTEM_PROMPT)],
        }
    }

    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    /// Ask a question, optionally with a picture of the problem.
    /// A failed call leaves the history untouched.
    pub fn ask<P: CompletionProvider + ?Sized>(
        &mut self,
        provider: &P,
        question: &str,
        image: Option<&ImageAttachment>,
    ) -> Result<String, AiError> {
        let (question, request) = self.prepare(question, image)?;
        let completion = provider.complete(&request)?;
        Ok(self.record(question, completion.content))
    }

    /// Same as [`ask`](Self::ask), handing the answer to `on_token` piece by
    /// piece as the provider streams it.
    pub fn ask_streaming<P, F>(
        &mut self,
        provider: &P,
        question: &str,
        image: Option<&ImageAttachment>,
        mut on_token: F,
    ) -> Result<String, AiError>
    where
        P: CompletionProvider + ?Sized,
        F: FnMut(&str),
    {
        let (question, request) = self.prepare(question, image)?;
        let completion = provider.complete_stream(&request, &mut on_token)?;
        Ok(self.record(question, completion.content))
    }

    fn prepare<'q>(
        &self,
        question: &'q str,
        image: Option<&ImageAttachment>,
    ) -> Result<(&'q str, CompletionRequest), AiError> {
        let question = question.trim();
        let question = match (question.is_empty(), image) {
            (true, Some(_)) => DEFAULT_IMAGE_QUESTION,
            (true, None) => {
                return Err(AiError::InvalidRequest("question is empty".to_string()))
            }
            (false, _) => question,
        };

        let turn = match image {
            Some(img) => ChatMessage::user_with_image(question, img.to_data_url()),
            None => ChatMessage::user(question),
        };

        let mut messages = self.history.clone();
        messages.push(turn);

        Ok((question, CompletionRequest::new(&self.model, messages)))
    }

    fn record(&mut self, question: &str, answer: String) -> String {
        self.history.push(ChatMessage::user(question));
        self.history.push(ChatMessage::assistant(answer.clone()));
        log::info!("Math solver answered ({} turns)", (self.history.len() - 1) / 2);
        answer
    }
}
