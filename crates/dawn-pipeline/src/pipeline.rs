use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;

use dawn_ai::{GenerateError, GenerateRequest, TextGenerator};
use dawn_core::{in_push_window, to_local};
use dawn_normalize::{normalize, NormalizeError};
use dawn_notify::Notifier;
use dawn_schema::Agenda;
use dawn_store::{AgendaCache, DeliveryLedger, DeliveryRecord, PlanSource, User};

use crate::config::PipelineConfig;
use crate::prompts::{render_prompt, JSON_PROMPT_TEMPLATE, TEXT_PROMPT_TEMPLATE};
use crate::render::render_text;

#[derive(Debug, Clone, PartialEq, Eq)]
/// Terminal state of one user's run through the delivery machine.
pub enum RunOutcome {
    /// Local time was outside the push window; nothing happened, nothing
    /// was recorded.
    OutsideWindow,
    /// A cached agenda for (user, date) was re-rendered and re-sent with no
    /// new generation call.
    CacheHit { delivered: bool },
    /// No plan document could be resolved; a `no_plan_md` failure record
    /// was written.
    NoPlan,
    /// The structured path produced a canonical agenda.
    Structured { delivered: bool },
    /// The structured path failed but the freeform output carried an
    /// extractable object.
    FreeformRecovered { delivered: bool },
    /// The raw freeform text was sent verbatim.
    FreeformPlain { delivered: bool },
    /// Terminal failure with no remaining fallback; the reason mirrors the
    /// ledger diagnostic.
    Failed { reason: String },
}

impl RunOutcome {
    pub fn delivered(&self) -> bool {
        matches!(
            self,
            RunOutcome::CacheHit { delivered: true }
                | RunOutcome::Structured { delivered: true }
                | RunOutcome::FreeformRecovered { delivered: true }
                | RunOutcome::FreeformPlain { delivered: true }
        )
    }
}

#[derive(Debug, Error)]
enum StructuredFailure {
    #[error("generation: {0}")]
    Generate(#[from] GenerateError),
    #[error("normalization: {0}")]
    Normalize(#[from] NormalizeError),
}

/// One independent delivery unit per user. The pipeline owns no mutable
/// state of its own; collaborators are shared behind `Arc`s so batches can
/// fan out.
pub struct DeliveryPipeline {
    config: PipelineConfig,
    generator: Arc<dyn TextGenerator>,
    notifier: Arc<dyn Notifier>,
    plans: Arc<dyn PlanSource>,
    cache: Arc<dyn AgendaCache>,
    ledger: Arc<dyn DeliveryLedger>,
}

impl DeliveryPipeline {
    pub fn new(
        config: PipelineConfig,
        generator: Arc<dyn TextGenerator>,
        notifier: Arc<dyn Notifier>,
        plans: Arc<dyn PlanSource>,
        cache: Arc<dyn AgendaCache>,
        ledger: Arc<dyn DeliveryLedger>,
    ) -> Self {
        Self {
            config,
            generator,
            notifier,
            plans,
            cache,
            ledger,
        }
    }

    /// Runs the full state machine for one user. Never returns an error:
    /// every failure is absorbed here and surfaced as a ledger record plus
    /// a [`RunOutcome`].
    pub async fn run_user(&self, user: &User, utc_now: DateTime<Utc>) -> RunOutcome {
        let local = match to_local(utc_now, &user.timezone) {
            Ok(local) => local,
            Err(error) => {
                let reason = format!("invalid_timezone: {error}");
                let date = utc_now.format("%Y-%m-%d").to_string();
                self.record(user, &date, false, &reason).await;
                return RunOutcome::Failed { reason };
            }
        };

        if !in_push_window(&local, self.config.push_hour, self.config.push_window_minutes) {
            return RunOutcome::OutsideWindow;
        }
        let date = local.format("%Y-%m-%d").to_string();

        match self.cache.get(&user.id, &date).await {
            Ok(Some(agenda)) => {
                tracing::debug!(user = %user.id, %date, "cache hit, re-sending existing agenda");
                let delivered = self.render_and_send(user, &date, &agenda).await;
                return RunOutcome::CacheHit { delivered };
            }
            Ok(None) => {}
            Err(error) => {
                // Unreadable cache degrades to a miss; regeneration follows.
                tracing::warn!(user = %user.id, %date, %error, "agenda cache read failed");
            }
        }

        let plan = match self.plans.resolve(&user.id, &date).await {
            Ok(Some(plan)) => plan,
            Ok(None) => {
                self.record(user, &date, false, "no_plan_md").await;
                return RunOutcome::NoPlan;
            }
            Err(error) => {
                tracing::warn!(user = %user.id, %date, %error, "plan resolution failed");
                self.record(user, &date, false, "no_plan_md").await;
                return RunOutcome::NoPlan;
            }
        };

        match self.structured_attempt(user, &date, &plan).await {
            Ok(agenda) => {
                self.persist(user, &date, &agenda).await;
                let delivered = self.render_and_send(user, &date, &agenda).await;
                return RunOutcome::Structured { delivered };
            }
            Err(failure) => {
                tracing::debug!(
                    user = %user.id,
                    %date,
                    %failure,
                    "structured path failed, falling back to freeform"
                );
            }
        }

        let prompt = render_prompt(TEXT_PROMPT_TEMPLATE, &date, &user.preferences, &plan);
        let text = match self
            .generator
            .generate(GenerateRequest {
                prompt,
                model: self.config.model.clone(),
                json_mode: false,
            })
            .await
        {
            Ok(text) => text,
            Err(error) => {
                let reason = format!("fallback_error: {error}");
                self.record(user, &date, false, &reason).await;
                return RunOutcome::Failed { reason };
            }
        };

        // The freeform answer sometimes embeds the object the structured
        // path was asked for; recover it opportunistically.
        if text.contains('{') && text.contains('}') {
            if let Ok(agenda) = normalize(&text, &date) {
                self.persist(user, &date, &agenda).await;
                let delivered = self.render_and_send(user, &date, &agenda).await;
                return RunOutcome::FreeformRecovered { delivered };
            }
        }

        let delivered = self.send(user, &date, &text).await;
        RunOutcome::FreeformPlain { delivered }
    }

    async fn structured_attempt(
        &self,
        user: &User,
        date: &str,
        plan: &str,
    ) -> Result<Agenda, StructuredFailure> {
        let prompt = render_prompt(JSON_PROMPT_TEMPLATE, date, &user.preferences, plan);
        let raw = self
            .generator
            .generate(GenerateRequest {
                prompt,
                model: self.config.model.clone(),
                json_mode: true,
            })
            .await?;
        Ok(normalize(&raw, date)?)
    }

    async fn persist(&self, user: &User, date: &str, agenda: &Agenda) {
        if let Err(error) = self.cache.put(&user.id, date, agenda).await {
            // Delivery still goes out; the next run will regenerate.
            tracing::warn!(user = %user.id, %date, %error, "failed to persist agenda");
        }
    }

    async fn render_and_send(&self, user: &User, date: &str, agenda: &Agenda) -> bool {
        self.send(user, date, &render_text(agenda)).await
    }

    async fn send(&self, user: &User, date: &str, text: &str) -> bool {
        let outcome = self
            .notifier
            .send(&user.endpoint, text, user.signing_secret.as_deref())
            .await;
        self.record(user, date, outcome.ok, &outcome.provider_message)
            .await;
        outcome.ok
    }

    async fn record(&self, user: &User, date: &str, ok: bool, provider_message: &str) {
        let record = DeliveryRecord::now(
            user.id.clone(),
            date,
            self.notifier.channel(),
            ok,
            provider_message,
        );
        if let Err(error) = self.ledger.append(&record).await {
            tracing::warn!(user = %user.id, %date, %error, "failed to append delivery record");
        }
    }
}
