use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::task::JoinSet;

use dawn_store::UserDirectory;

use crate::pipeline::{DeliveryPipeline, RunOutcome};

#[derive(Debug, Default)]
/// Aggregated result of one batch run.
pub struct BatchSummary {
    /// Per-user terminal outcomes, in completion order.
    pub outcomes: Vec<(String, RunOutcome)>,
    /// Units that panicked and were absorbed by the join loop.
    pub panicked: usize,
}

impl BatchSummary {
    pub fn delivered(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| outcome.delivered())
            .count()
    }

    pub fn skipped(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| matches!(outcome, RunOutcome::OutsideWindow))
            .count()
    }
}

/// Runs the pipeline once for every active user, one independent unit per
/// user, all launched together and awaited jointly.
///
/// A unit's failure is fully contained: errors terminate inside
/// [`DeliveryPipeline::run_user`], and a panicking unit is absorbed at the
/// join without affecting its siblings.
pub async fn run_batch(
    pipeline: Arc<DeliveryPipeline>,
    directory: &dyn UserDirectory,
    utc_now: DateTime<Utc>,
) -> anyhow::Result<BatchSummary> {
    let users = directory.load_active_users().await?;
    tracing::info!(users = users.len(), "starting delivery batch");

    let mut units = JoinSet::new();
    for user in users {
        let pipeline = pipeline.clone();
        units.spawn(async move {
            let outcome = pipeline.run_user(&user, utc_now).await;
            (user.id, outcome)
        });
    }

    let mut summary = BatchSummary::default();
    while let Some(joined) = units.join_next().await {
        match joined {
            Ok((user_id, outcome)) => {
                tracing::debug!(user = %user_id, ?outcome, "unit finished");
                summary.outcomes.push((user_id, outcome));
            }
            Err(join_error) => {
                summary.panicked += 1;
                tracing::warn!(%join_error, "delivery unit panicked");
            }
        }
    }

    tracing::info!(
        delivered = summary.delivered(),
        skipped = summary.skipped(),
        panicked = summary.panicked,
        total = summary.outcomes.len(),
        "delivery batch finished"
    );
    Ok(summary)
}
