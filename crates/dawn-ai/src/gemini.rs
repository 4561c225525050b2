use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{GenerateError, GenerateRequest, TextGenerator};

pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";
const DEFAULT_TIMEOUT_MS: u64 = 30_000;
const GENERATION_TEMPERATURE: f64 = 0.7;
const GENERATION_MAX_OUTPUT_TOKENS: u32 = 1_000;
const DIAGNOSTIC_BODY_MAX_CHARS: usize = 500;

#[derive(Debug, Clone)]
/// Connection settings for the Generative Language API.
pub struct GeminiConfig {
    pub api_base: String,
    pub api_key: String,
    pub default_model: String,
    pub request_timeout_ms: u64,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            api_key: String::new(),
            default_model: DEFAULT_MODEL.to_string(),
            request_timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

#[derive(Debug, Clone)]
/// `generateContent` client. One request per generation call, no retries.
pub struct GeminiClient {
    client: reqwest::Client,
    config: GeminiConfig,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Result<Self, GenerateError> {
        if config.api_key.trim().is_empty() {
            return Err(GenerateError::MissingApiKey);
        }

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_millis(
                config.request_timeout_ms.max(1),
            ))
            .build()?;

        Ok(Self { client, config })
    }

    fn generate_content_url(&self, model: &str) -> String {
        let base = self.config.api_base.trim_end_matches('/');
        if base.contains(":generateContent") {
            return base.replace("{model}", model);
        }
        format!("{base}/models/{model}:generateContent")
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, request: GenerateRequest) -> Result<String, GenerateError> {
        let model = request
            .model
            .as_deref()
            .unwrap_or(&self.config.default_model);
        let url = self.generate_content_url(model);
        let body = build_generate_content_body(&request);

        tracing::debug!(model, json_mode = request.json_mode, "generation request");

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.config.api_key.as_str())])
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let raw = response.text().await?;
        if !status.is_success() {
            return Err(GenerateError::HttpStatus {
                status: status.as_u16(),
                body: truncate_chars(&raw, DIAGNOSTIC_BODY_MAX_CHARS),
            });
        }

        parse_generate_content_response(&raw)
    }
}

fn build_generate_content_body(request: &GenerateRequest) -> Value {
    let mut generation_config = json!({
        "temperature": GENERATION_TEMPERATURE,
        "maxOutputTokens": GENERATION_MAX_OUTPUT_TOKENS,
    });
    if request.json_mode {
        generation_config["responseMimeType"] = json!("application/json");
    }

    json!({
        "contents": [{ "parts": [{ "text": request.prompt }] }],
        "generationConfig": generation_config,
    })
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

fn parse_generate_content_response(raw: &str) -> Result<String, GenerateError> {
    let parsed: GenerateContentResponse = serde_json::from_str(raw)
        .map_err(|_| GenerateError::InvalidResponse(truncate_chars(raw, DIAGNOSTIC_BODY_MAX_CHARS)))?;

    let text = parsed
        .candidates
        .first()
        .and_then(|candidate| candidate.content.as_ref())
        .and_then(|content| content.parts.first())
        .and_then(|part| part.text.as_deref())
        .unwrap_or_default()
        .trim()
        .to_string();

    if text.is_empty() {
        return Err(GenerateError::EmptyResponse(truncate_chars(
            raw,
            DIAGNOSTIC_BODY_MAX_CHARS,
        )));
    }
    Ok(text)
}

fn truncate_chars(raw: &str, limit: usize) -> String {
    raw.chars().take(limit).collect()
}
