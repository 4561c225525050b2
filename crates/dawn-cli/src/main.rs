use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use dawn_ai::{GeminiClient, GeminiConfig};
use dawn_core::now_utc;
use dawn_notify::WebhookNotifier;
use dawn_pipeline::{run_batch, DeliveryPipeline, PipelineConfig};
use dawn_store::{FsAgendaCache, FsDeliveryLedger, FsPlanSource, FsUserDirectory};

#[derive(Debug, Parser)]
#[command(
    name = "dawn",
    about = "Daily agenda generation and webhook delivery",
    version
)]
struct Cli {
    #[arg(
        long = "data-dir",
        env = "DAWN_DATA_DIR",
        default_value = ".",
        help = "Directory holding users.csv, plans/, agendas/ and deliveries.csv"
    )]
    data_dir: PathBuf,

    #[arg(
        long = "api-key",
        env = "GOOGLE_API_KEY",
        default_value = "",
        hide_env_values = true,
        help = "Gemini API key"
    )]
    api_key: String,

    #[arg(
        long = "api-base",
        env = "GEMINI_API_BASE",
        default_value = "https://generativelanguage.googleapis.com/v1beta",
        help = "Base URL for the Gemini API"
    )]
    api_base: String,

    #[arg(
        long,
        env = "GEMINI_MODEL",
        help = "Model override; defaults to the client's built-in model"
    )]
    model: Option<String>,

    #[arg(
        long = "push-hour",
        env = "PUSH_HOUR",
        default_value_t = dawn_pipeline::DEFAULT_PUSH_HOUR,
        help = "Local hour (0-23) the daily push is centered on"
    )]
    push_hour: u32,

    #[arg(
        long = "push-window-min",
        env = "PUSH_WINDOW_MIN",
        default_value_t = dawn_pipeline::DEFAULT_PUSH_WINDOW_MINUTES,
        help = "Half-width of the push window, in minutes"
    )]
    push_window_minutes: i64,
}

fn init_tracing() {
    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let generator = GeminiClient::new(GeminiConfig {
        api_base: cli.api_base.clone(),
        api_key: cli.api_key.clone(),
        ..GeminiConfig::default()
    })
    .context("failed to construct Gemini client")?;
    let notifier = WebhookNotifier::new().context("failed to construct webhook client")?;

    let directory = FsUserDirectory::new(&cli.data_dir);
    let pipeline = Arc::new(DeliveryPipeline::new(
        PipelineConfig {
            push_hour: cli.push_hour,
            push_window_minutes: cli.push_window_minutes,
            model: cli.model.clone(),
        },
        Arc::new(generator),
        Arc::new(notifier),
        Arc::new(FsPlanSource::new(&cli.data_dir)),
        Arc::new(FsAgendaCache::new(&cli.data_dir)),
        Arc::new(FsDeliveryLedger::new(&cli.data_dir)),
    ));

    let summary = run_batch(pipeline, &directory, now_utc()).await?;
    if summary.panicked > 0 {
        anyhow::bail!("{} delivery unit(s) panicked", summary.panicked);
    }
    Ok(())
}
