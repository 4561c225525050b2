use async_trait::async_trait;
use serde_json::{json, Value};

use crate::sign::gen_signature;
use crate::{DeliveryOutcome, Notifier};

const DEFAULT_TIMEOUT_MS: u64 = 15_000;
const DIAGNOSTIC_BODY_MAX_CHARS: usize = 500;
const CHANNEL: &str = "feishu";

#[derive(Debug, Clone)]
/// Feishu-style custom-bot webhook sender.
///
/// The payload is `{"msg_type":"text","content":{"text":...}}`; when a
/// signing secret is supplied, `timestamp` and `sign` query parameters are
/// appended to the webhook URL.
pub struct WebhookNotifier {
    client: reqwest::Client,
}

impl WebhookNotifier {
    pub fn new() -> Result<Self, reqwest::Error> {
        Self::with_timeout_ms(DEFAULT_TIMEOUT_MS)
    }

    pub fn with_timeout_ms(timeout_ms: u64) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_millis(timeout_ms.max(1)))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    fn channel(&self) -> &str {
        CHANNEL
    }

    async fn send(&self, endpoint: &str, text: &str, secret: Option<&str>) -> DeliveryOutcome {
        if endpoint.is_empty() {
            return DeliveryOutcome::failed("missing webhook");
        }

        let mut url = endpoint.to_string();
        if let Some(secret) = secret {
            match gen_signature(secret) {
                Ok((timestamp, sign)) => {
                    let delimiter = if url.contains('?') { '&' } else { '?' };
                    url = format!("{url}{delimiter}timestamp={timestamp}&sign={sign}");
                }
                Err(error) => {
                    return DeliveryOutcome::failed(format!("signature_error: {error}"));
                }
            }
        }

        let payload = json!({
            "msg_type": "text",
            "content": { "text": text },
        });
        tracing::debug!(signed = secret.is_some(), chars = text.chars().count(), "posting webhook message");

        let response = match self.client.post(&url).json(&payload).send().await {
            Ok(response) => response,
            Err(error) => {
                return DeliveryOutcome::failed(format!("http_error: {error}"));
            }
        };

        let status = response.status();
        let raw = match response.text().await {
            Ok(raw) => raw,
            Err(error) => {
                return DeliveryOutcome::failed(format!("http_error: {error}"));
            }
        };

        if !status.is_success() {
            return DeliveryOutcome::failed(format!(
                "http_status_{}: {}",
                status.as_u16(),
                truncate_chars(&raw, DIAGNOSTIC_BODY_MAX_CHARS)
            ));
        }

        let Ok(data) = serde_json::from_str::<Value>(&raw) else {
            return DeliveryOutcome::failed(format!(
                "invalid_json_response: {}",
                truncate_chars(&raw, DIAGNOSTIC_BODY_MAX_CHARS)
            ));
        };

        // The provider reports application-level failures with HTTP 200 and
        // a non-zero StatusCode in the body.
        match data.get("StatusCode").and_then(Value::as_i64) {
            Some(0) | None => DeliveryOutcome::delivered(data.to_string()),
            Some(_) => DeliveryOutcome::failed(data.to_string()),
        }
    }
}

fn truncate_chars(raw: &str, limit: usize) -> String {
    raw.chars().take(limit).collect()
}
