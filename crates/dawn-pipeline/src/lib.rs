//! Per-user delivery orchestration: window gate, cache short-circuit,
//! structured generation with a single freeform fallback, rendering,
//! webhook delivery, and ledger recording.
//!
//! Every stage returns an explicit value; the orchestrator pattern-matches
//! to pick the next stage. No error crosses a user's run boundary; the
//! worst outcome is a failure record in the ledger.

mod batch;
mod config;
mod pipeline;
mod prompts;
mod render;

pub use batch::{run_batch, BatchSummary};
pub use config::{PipelineConfig, DEFAULT_PUSH_HOUR, DEFAULT_PUSH_WINDOW_MINUTES};
pub use pipeline::{DeliveryPipeline, RunOutcome};
pub use prompts::{render_prompt, JSON_PROMPT_TEMPLATE, TEXT_PROMPT_TEMPLATE};
pub use render::render_text;
