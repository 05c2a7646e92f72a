use thiserror::Error;

#[derive(Error, Debug)]
pub enum AiError {
    #[error("No API key configured (set OPENAI_API_KEY or api_key in config.toml)")]
    MissingCredentials,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Authentication failed: {0}")]
    Unauthorized(String),

    #[error("Rate limited by the API")]
    RateLimited,

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Stream read error: {0}")]
    Stream(#[from] std::io::Error),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl AiError {
    /// Credential errors block the action outright; everything else is
    /// treated as a transient, skippable failure.
    pub fn is_credential_error(&self) -> bool {
        matches!(self, AiError::MissingCredentials)
    }
}
