//! Scripted providers for unit tests.

use std::cell::RefCell;
use std::collections::VecDeque;

use super::client::{CompletionProvider, ImageProvider};
use super::error::AiError;
use super::models::{Completion, CompletionRequest, ImageReference, ImageRequest};

enum Step {
    Reply(String),
    /// Delivered piece by piece when streamed
    Chunks(Vec<String>),
    Fail(AiError),
}

/// Replays queued replies in order and records every request it saw.
/// Runs out to a `MalformedResponse` error.
#[derive(Default)]
pub struct ScriptedProvider {
    steps: RefCell<VecDeque<Step>>,
    pub requests: RefCell<Vec<CompletionRequest>>,
    pub image_requests: RefCell<Vec<ImageRequest>>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, content: impl Into<String>) -> Self {
        self.steps.borrow_mut().push_back(Step::Reply(content.into()));
        self
    }

    /// A reply that streams as the given pieces
    pub fn stream(self, chunks: &[&str]) -> Self {
        let chunks = chunks.iter().map(|c| c.to_string()).collect();
        self.steps.borrow_mut().push_back(Step::Chunks(chunks));
        self
    }

    pub fn fail(self, error: AiError) -> Self {
        self.steps.borrow_mut().push_back(Step::Fail(error));
        self
    }

    pub fn request_count(&self) -> usize {
        self.requests.borrow().len()
    }

    fn next_step(&self) -> Step {
        self.steps
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Step::Fail(AiError::MalformedResponse("script exhausted".into())))
    }
}

fn completion(request: &CompletionRequest, content: String) -> Completion {
    Completion {
        content,
        model: request.model.clone(),
        tokens_used: None,
        finish_reason: Some("stop".into()),
    }
}

impl CompletionProvider for ScriptedProvider {
    fn complete(&self, request: &CompletionRequest) -> Result<Completion, AiError> {
        self.requests.borrow_mut().push(request.clone());
        match self.next_step() {
            Step::Reply(content) => Ok(completion(request, content)),
            Step::Chunks(chunks) => Ok(completion(request, chunks.concat())),
            Step::Fail(e) => Err(e),
        }
    }

    fn complete_stream(
        &self,
        request: &CompletionRequest,
        on_token: &mut dyn FnMut(&str),
    ) -> Result<Completion, AiError> {
        self.requests.borrow_mut().push(request.clone());
        let chunks = match self.next_step() {
            Step::Reply(content) => vec![content],
            Step::Chunks(chunks) => chunks,
            Step::Fail(e) => return Err(e),
        };
        for chunk in &chunks {
            on_token(chunk);
        }
        Ok(completion(request, chunks.concat()))
    }
}

impl ImageProvider for ScriptedProvider {
    fn generate_image(&self, request: &ImageRequest) -> Result<ImageReference, AiError> {
        self.image_requests.borrow_mut().push(request.clone());
        match self.next_step() {
            Step::Reply(url) => Ok(ImageReference::Url(url)),
            Step::Chunks(chunks) => Ok(ImageReference::Url(chunks.concat())),
            Step::Fail(e) => Err(e),
        }
    }
}
