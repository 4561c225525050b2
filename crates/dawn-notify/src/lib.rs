//! Delivery of rendered agenda text to per-user chat webhooks.
//!
//! A send never raises: every outcome, including transport failures and
//! signing problems, is reported as a [`DeliveryOutcome`] so the pipeline
//! can ledger it and move on.

mod sign;
mod webhook;

use async_trait::async_trait;

pub use sign::sign_with_timestamp;
pub use webhook::WebhookNotifier;

#[derive(Debug, Clone, PartialEq, Eq)]
/// Result of one delivery attempt: success flag plus the provider's
/// diagnostic text, recorded verbatim in the ledger.
pub struct DeliveryOutcome {
    pub ok: bool,
    pub provider_message: String,
}

impl DeliveryOutcome {
    pub fn delivered(provider_message: impl Into<String>) -> Self {
        Self {
            ok: true,
            provider_message: provider_message.into(),
        }
    }

    pub fn failed(provider_message: impl Into<String>) -> Self {
        Self {
            ok: false,
            provider_message: provider_message.into(),
        }
    }
}

#[async_trait]
/// Trait contract for notification backends.
pub trait Notifier: Send + Sync {
    /// Channel tag written into delivery records.
    fn channel(&self) -> &str;

    async fn send(&self, endpoint: &str, text: &str, secret: Option<&str>) -> DeliveryOutcome;
}
