use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq)]
/// One generation call: a prompt, an optional model override, and whether
/// the provider should be asked for a JSON-shaped response.
pub struct GenerateRequest {
    pub prompt: String,
    pub model: Option<String>,
    pub json_mode: bool,
}

impl GenerateRequest {
    pub fn structured(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            model: None,
            json_mode: true,
        }
    }

    pub fn freeform(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            model: None,
            json_mode: false,
        }
    }
}

#[derive(Debug, Error)]
/// Generation failures, from missing credentials through empty output.
pub enum GenerateError {
    #[error("missing API key")]
    MissingApiKey,
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("provider returned non-success status {status}: {body}")]
    HttpStatus { status: u16, body: String },
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("empty model output: {0}")]
    EmptyResponse(String),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

#[async_trait]
/// Trait contract for text generation backends.
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, request: GenerateRequest) -> Result<String, GenerateError>;
}
