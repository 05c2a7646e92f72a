use std::io::{BufRead, BufReader};
use std::time::Duration;

use reqwest::blocking::{Client, Response};
use reqwest::StatusCode;
use serde_json::{json, Value};

use crate::config::AppConfig;

use super::error::AiError;
use super::models::{Completion, CompletionRequest, ImageReference, ImageRequest};

/// Anything that can answer a chat completion request
pub trait CompletionProvider {
    fn complete(&self, request: &CompletionRequest) -> Result<Completion, AiError>;

    /// Like `complete`, but hands each piece of text to `on_token` as it
    /// arrives. Providers that cannot stream deliver the answer in one piece.
    fn complete_stream(
        &self,
        request: &CompletionRequest,
        on_token: &mut dyn FnMut(&str),
    ) -> Result<Completion, AiError> {
        let completion = self.complete(request)?;
        on_token(&completion.content);
        Ok(completion)
    }
}

/// Anything that can turn a prompt into an image
pub trait ImageProvider {
    fn generate_image(&self, request: &ImageRequest) -> Result<ImageReference, AiError>;
}

/// Blocking client for OpenAI-compatible REST APIs
pub struct OpenAiClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl OpenAiClient {
    pub fn new(
        base_url: &str,
        api_key: Option<String>,
        connect_timeout: Duration,
        timeout: Duration,
    ) -> Result<Self, AiError> {
        let base_url = base_url.trim_end_matches('/').to_string();

        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(AiError::InvalidRequest(
                "URL must start with http:// or https://".to_string(),
            ));
        }

        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base_url,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, AiError> {
        Self::new(
            &config.base_url,
            config.api_key.clone(),
            Duration::from_secs(config.timeouts.connect_secs),
            Duration::from_secs(config.timeouts.request_secs),
        )
    }

    pub fn has_credentials(&self) -> bool {
        self.api_key.is_some()
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// POST a JSON body and return the response once its status is a success
    fn send(&self, path: &str, body: &Value) -> Result<Response, AiError> {
        let api_key = self.api_key.as_deref().ok_or(AiError::MissingCredentials)?;
        let url = self.url(path);
        log::debug!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(body)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().unwrap_or_default();
            return Err(status_error(status, message));
        }

        Ok(response)
    }

    fn post_json(&self, path: &str, body: &Value) -> Result<Value, AiError> {
        Ok(self.send(path, body)?.json::<Value>()?)
    }
}

impl CompletionProvider for OpenAiClient {
    fn complete(&self, request: &CompletionRequest) -> Result<Completion, AiError> {
        let body = chat_request_body(request)?;
        let value = self.post_json("chat/completions", &body)?;
        parse_chat_response(&value)
    }

    fn complete_stream(
        &self,
        request: &CompletionRequest,
        on_token: &mut dyn FnMut(&str),
    ) -> Result<Completion, AiError> {
        let mut body = chat_request_body(request)?;
        body["stream"] = json!(true);
        let response = self.send("chat/completions", &body)?;
        read_chat_stream(BufReader::new(response), on_token)
    }
}

impl ImageProvider for OpenAiClient {
    fn generate_image(&self, request: &ImageRequest) -> Result<ImageReference, AiError> {
        let body = json!({
            "model": request.model,
            "prompt": request.prompt,
            "size": request.size,
            "n": 1,
        });
        let value = self.post_json("images/generations", &body)?;
        parse_image_response(&value)
    }
}

fn status_error(status: StatusCode, message: String) -> AiError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => AiError::Unauthorized(message),
        StatusCode::TOO_MANY_REQUESTS => AiError::RateLimited,
        _ => AiError::Api {
            status: status.as_u16(),
            message,
        },
    }
}

/// Build the `chat/completions` request body
pub(crate) fn chat_request_body(request: &CompletionRequest) -> Result<Value, AiError> {
    if request.messages.is_empty() {
        return Err(AiError::InvalidRequest("no messages".to_string()));
    }

    let mut body = json!({
        "model": request.model,
        "messages": serde_json::to_value(&request.messages)?,
    });
    if let Some(t) = request.temperature {
        body["temperature"] = json!(t);
    }
    if request.json_response {
        body["response_format"] = json!({"type": "json_object"});
    }
    Ok(body)
}

pub(crate) fn parse_chat_response(value: &Value) -> Result<Completion, AiError> {
    let choice = value["choices"]
        .get(0)
        .ok_or_else(|| AiError::MalformedResponse("no choices in response".to_string()))?;

    let content = choice["message"]["content"]
        .as_str()
        .ok_or_else(|| AiError::MalformedResponse("choice has no text content".to_string()))?
        .to_string();

    Ok(Completion {
        content,
        model: value["model"].as_str().unwrap_or_default().to_string(),
        tokens_used: value["usage"]["total_tokens"].as_i64(),
        finish_reason: choice["finish_reason"].as_str().map(|s| s.to_string()),
    })
}

/// Read an OpenAI-style server-sent event stream of chat deltas until
/// `data: [DONE]` or end of input.
pub(crate) fn read_chat_stream<R: BufRead>(
    reader: R,
    on_token: &mut dyn FnMut(&str),
) -> Result<Completion, AiError> {
    let mut completion = Completion {
        content: String::new(),
        model: String::new(),
        tokens_used: None,
        finish_reason: None,
    };

    for line in reader.lines() {
        let line = line?;
        let Some(data) = line.trim().strip_prefix("data:") else {
            // Comments, event names and keep-alive blank lines
            continue;
        };
        let data = data.trim_start();
        if data == "[DONE]" {
            break;
        }

        let event: Value = serde_json::from_str(data)
            .map_err(|e| AiError::MalformedResponse(format!("bad stream event: {}", e)))?;

        if let Some(message) = event["error"]["message"].as_str() {
            return Err(AiError::Api {
                status: 200,
                message: message.to_string(),
            });
        }
        if let Some(model) = event["model"].as_str() {
            completion.model = model.to_string();
        }
        if let Some(total) = event["usage"]["total_tokens"].as_i64() {
            completion.tokens_used = Some(total);
        }

        let Some(choice) = event["choices"].get(0) else {
            continue;
        };
        if let Some(text) = choice["delta"]["content"].as_str() {
            if !text.is_empty() {
                on_token(text);
                completion.content.push_str(text);
            }
        }
        if let Some(reason) = choice["finish_reason"].as_str() {
            completion.finish_reason = Some(reason.to_string());
        }
    }

    if completion.content.is_empty() {
        return Err(AiError::MalformedResponse(
            "stream ended without text content".to_string(),
        ));
    }
    Ok(completion)
}

pub(crate) fn parse_image_response(value: &Value) -> Result<ImageReference, AiError> {
    let first = value["data"]
        .get(0)
        .ok_or_else(|| AiError::MalformedResponse("no image in response".to_string()))?;

    if let Some(url) = first["url"].as_str() {
        return Ok(ImageReference::Url(url.to_string()));
    }
    if let Some(b64) = first["b64_json"].as_str() {
        return Ok(ImageReference::Base64(b64.to_string()));
    }
    Err(AiError::MalformedResponse(
        "image entry has neither url nor b64_json".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::models::ChatMessage;

    #[test]
    fn test_chat_body_includes_json_format_and_temperature() {
        let request = CompletionRequest::new("gpt-4o-mini", vec![ChatMessage::user("hi")])
            .with_temperature(0.3)
            .with_json_response();

        let body = chat_request_body(&request).unwrap();
        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["temperature"], 0.3);
        assert_eq!(body["response_format"]["type"], "json_object");
        assert_eq!(body["messages"][0]["content"], "hi");
    }

    #[test]
    fn test_chat_body_omits_optional_fields() {
        let request = CompletionRequest::new("gpt-4o", vec![ChatMessage::user("hi")]);
        let body = chat_request_body(&request).unwrap();
        assert!(body.get("temperature").is_none());
        assert!(body.get("response_format").is_none());
    }

    #[test]
    fn test_chat_body_rejects_empty_messages() {
        let request = CompletionRequest::new("gpt-4o", Vec::new());
        assert!(matches!(
            chat_request_body(&request),
            Err(AiError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_parse_chat_response() {
        let value = json!({
            "model": "gpt-4o-2024-08-06",
            "choices": [{"message": {"role": "assistant", "content": "x = 4"}, "finish_reason": "stop"}],
            "usage": {"total_tokens": 42}
        });
        let completion = parse_chat_response(&value).unwrap();
        assert_eq!(completion.content, "x = 4");
        assert_eq!(completion.tokens_used, Some(42));
        assert_eq!(completion.finish_reason.as_deref(), Some("stop"));
    }

    #[test]
    fn test_parse_chat_response_without_choices() {
        let value = json!({"error": {"message": "oops"}});
        assert!(matches!(
            parse_chat_response(&value),
            Err(AiError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_parse_image_response_variants() {
        let url = json!({"data": [{"url": "https://img.example/1.png"}]});
        assert_eq!(
            parse_image_response(&url).unwrap(),
            ImageReference::Url("https://img.example/1.png".to_string())
        );

        let b64 = json!({"data": [{"b64_json": "iVBORw0"}]});
        assert_eq!(
            parse_image_response(&b64).unwrap(),
            ImageReference::Base64("iVBORw0".to_string())
        );

        assert!(parse_image_response(&json!({"data": []})).is_err());
    }

    #[test]
    fn test_status_mapping() {
        assert!(matches!(
            status_error(StatusCode::UNAUTHORIZED, String::new()),
            AiError::Unauthorized(_)
        ));
        assert!(matches!(
            status_error(StatusCode::TOO_MANY_REQUESTS, String::new()),
            AiError::RateLimited
        ));
        assert!(matches!(
            status_error(StatusCode::BAD_GATEWAY, "down".to_string()),
            AiError::Api { status: 502, .. }
        ));
    }

    #[test]
    fn test_missing_key_fails_before_network() {
        let client = OpenAiClient::new(
            "http://127.0.0.1:9",
            None,
            Duration::from_secs(1),
            Duration::from_secs(1),
        )
        .unwrap();
        assert!(!client.has_credentials());

        let request = CompletionRequest::new("gpt-4o", vec![ChatMessage::user("hi")]);
        assert!(matches!(
            client.complete(&request),
            Err(AiError::MissingCredentials)
        ));
    }

    #[test]
    fn test_read_chat_stream_collects_deltas() {
        let stream = concat!(
            ": keep-alive\n",
            "\n",
            "data: {\"model\":\"gpt-4o\",\"choices\":[{\"delta\":{\"role\":\"assistant\"}}]}\n",
            "\n",
            "data: {\"model\":\"gpt-4o\",\"choices\":[{\"delta\":{\"content\":\"1. x\"}}]}\n",
            "data: {\"model\":\"gpt-4o\",\"choices\":[{\"delta\":{\"content\":\" = 4\"}}]}\n",
            "data:{\"choices\":[{\"delta\":{},\"finish_reason\":\"stop\"}]}\n",
            "data: [DONE]\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"ignored\"}}]}\n",
        );

        let mut tokens = Vec::new();
        let completion =
            read_chat_stream(stream.as_bytes(), &mut |t: &str| tokens.push(t.to_string())).unwrap();

        assert_eq!(tokens, vec!["1. x", " = 4"]);
        assert_eq!(completion.content, "1. x = 4");
        assert_eq!(completion.model, "gpt-4o");
        assert_eq!(completion.finish_reason.as_deref(), Some("stop"));
    }

    #[test]
    fn test_read_chat_stream_errors() {
        let mut ignore = |_: &str| {};

        let error_event = "data: {\"error\":{\"message\":\"overloaded\"}}\n";
        assert!(matches!(
            read_chat_stream(error_event.as_bytes(), &mut ignore),
            Err(AiError::Api { .. })
        ));

        assert!(matches!(
            read_chat_stream("data: {not json\n".as_bytes(), &mut ignore),
            Err(AiError::MalformedResponse(_))
        ));

        assert!(matches!(
            read_chat_stream("data: [DONE]\n".as_bytes(), &mut ignore),
            Err(AiError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_stream_without_key_fails_before_network() {
        let client = OpenAiClient::new(
            "http://127.0.0.1:9",
            None,
            Duration::from_secs(1),
            Duration::from_secs(1),
        )
        .unwrap();
        let request = CompletionRequest::new("gpt-4o", vec![ChatMessage::user("hi")]);
        let mut tokens = 0;
        assert!(matches!(
            client.complete_stream(&request, &mut |_: &str| tokens += 1),
            Err(AiError::MissingCredentials)
        ));
        assert_eq!(tokens, 0);
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(OpenAiClient::new(
            "api.openai.com",
            Some("k".into()),
            Duration::from_secs(1),
            Duration::from_secs(1)
        )
        .is_err());
    }
}
