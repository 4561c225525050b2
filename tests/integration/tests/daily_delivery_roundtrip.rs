//! End-to-end delivery runs over the real filesystem stores, with a
//! scripted generator and a capturing notifier standing in for the network.

use std::{
    collections::VecDeque,
    fs,
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex as StdMutex,
    },
    time::{SystemTime, UNIX_EPOCH},
};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use tokio::sync::Mutex as AsyncMutex;

use dawn_ai::{GenerateError, GenerateRequest, TextGenerator};
use dawn_notify::{DeliveryOutcome, Notifier};
use dawn_pipeline::{run_batch, DeliveryPipeline, PipelineConfig};
use dawn_schema::Agenda;
use dawn_store::{
    DeliveryRecord, FsAgendaCache, FsDeliveryLedger, FsPlanSource, FsUserDirectory,
};

static WORKSPACE_COUNTER: AtomicU64 = AtomicU64::new(1);

const DATE: &str = "2024-01-01";
const CANONICAL_JSON: &str =
    "{\"date\":\"2024-01-01\",\"focus\":\"ship the release\",\"blocks\":[{\"start\":\"9:00\",\"end\":\"11:00\",\"task\":\"final review\",\"priority\":\"M\"}],\"reminders\":[\"drink water\"],\"risks\":[]}";

struct ScriptedGenerator {
    responses: AsyncMutex<VecDeque<Result<String, GenerateError>>>,
    requests: AsyncMutex<Vec<GenerateRequest>>,
}

impl ScriptedGenerator {
    fn new(responses: Vec<Result<String, GenerateError>>) -> Self {
        Self {
            responses: AsyncMutex::new(VecDeque::from(responses)),
            requests: AsyncMutex::new(Vec::new()),
        }
    }

    async fn request_count(&self) -> usize {
        self.requests.lock().await.len()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, request: GenerateRequest) -> Result<String, GenerateError> {
        self.requests.lock().await.push(request);
        self.responses
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| Err(GenerateError::InvalidResponse("scripted queue exhausted".into())))
    }
}

struct CapturingNotifier {
    sent: StdMutex<Vec<(String, String)>>,
}

impl CapturingNotifier {
    fn new() -> Self {
        Self {
            sent: StdMutex::new(Vec::new()),
        }
    }

    fn sent(&self) -> Vec<(String, String)> {
        self.sent
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[async_trait]
impl Notifier for CapturingNotifier {
    fn channel(&self) -> &str {
        "feishu"
    }

    async fn send(&self, endpoint: &str, text: &str, _secret: Option<&str>) -> DeliveryOutcome {
        self.sent
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push((endpoint.to_string(), text.to_string()));
        DeliveryOutcome::delivered("{\"StatusCode\":0}")
    }
}

struct IsolatedWorkspace {
    root: PathBuf,
}

impl IsolatedWorkspace {
    fn new(label: &str) -> Self {
        let tick = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock should be after unix epoch")
            .as_nanos();
        let count = WORKSPACE_COUNTER.fetch_add(1, Ordering::Relaxed);
        let root = std::env::temp_dir().join(format!(
            "dawn-{label}-{}-{tick}-{count}",
            std::process::id()
        ));
        fs::create_dir_all(&root).expect("must create isolated workspace root");
        Self { root }
    }

    fn root(&self) -> &Path {
        &self.root
    }

    fn seed_user(&self, id: &str, timezone: &str) {
        let users = self.root.join("users.csv");
        if !users.exists() {
            fs::write(
                &users,
                "public_id,timezone,feishu_webhook,feishu_secret,prefs,active\n",
            )
            .expect("write users header");
        }
        let mut raw = fs::read_to_string(&users).expect("read users");
        raw.push_str(&format!(
            "{id},{timezone},https://hook.test/{id},,short focused days,true\n"
        ));
        fs::write(&users, raw).expect("append user");
    }

    fn seed_plan(&self, id: &str, date: &str, content: &str) {
        let plans = self.root.join("plans");
        fs::create_dir_all(&plans).expect("plans dir");
        fs::write(plans.join(format!("{id}.{date}.md")), content).expect("write plan");
    }

    fn agenda_path(&self, id: &str, date: &str) -> PathBuf {
        self.root.join("agendas").join(date).join(format!("{id}.json"))
    }

    fn ledger_lines(&self) -> Vec<String> {
        let path = self.root.join("deliveries.csv");
        if !path.exists() {
            return Vec::new();
        }
        fs::read_to_string(path)
            .expect("read ledger")
            .lines()
            .map(str::to_string)
            .collect()
    }
}

impl Drop for IsolatedWorkspace {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.root);
    }
}

fn pipeline_over(
    workspace: &IsolatedWorkspace,
    generator: Arc<ScriptedGenerator>,
    notifier: Arc<CapturingNotifier>,
) -> Arc<DeliveryPipeline> {
    Arc::new(DeliveryPipeline::new(
        PipelineConfig::default(),
        generator,
        notifier,
        Arc::new(FsPlanSource::new(workspace.root())),
        Arc::new(FsAgendaCache::new(workspace.root())),
        Arc::new(FsDeliveryLedger::new(workspace.root())),
    ))
}

fn in_window_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 7, 3, 0).unwrap()
}

#[tokio::test]
async fn structured_roundtrip_persists_agenda_and_ledger() {
    let workspace = IsolatedWorkspace::new("roundtrip");
    workspace.seed_user("u1", "UTC");
    workspace.seed_plan("u1", DATE, "- morning: final review\n- afternoon: retro");

    let generator = Arc::new(ScriptedGenerator::new(vec![Ok(format!(
        "```json\n{CANONICAL_JSON}\n```"
    ))]));
    let notifier = Arc::new(CapturingNotifier::new());
    let pipeline = pipeline_over(&workspace, generator.clone(), notifier.clone());
    let directory = FsUserDirectory::new(workspace.root());

    let summary = run_batch(pipeline, &directory, in_window_now())
        .await
        .expect("batch runs");

    assert_eq!(summary.outcomes.len(), 1);
    assert_eq!(summary.delivered(), 1);
    assert_eq!(summary.panicked, 0);

    // The canonical agenda landed on disk with normalized wall-clock times.
    let raw = fs::read_to_string(workspace.agenda_path("u1", DATE)).expect("agenda file");
    let agenda: Agenda = serde_json::from_str(&raw).expect("agenda parses");
    assert_eq!(agenda.date, DATE);
    assert_eq!(agenda.blocks[0].start, "09:00");

    let sent = notifier.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, "https://hook.test/u1");
    assert!(sent[0].1.starts_with("📅 2024-01-01｜主题：ship the release"));
    assert!(sent[0].1.contains("⏰ 提醒："));

    let lines = workspace.ledger_lines();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0], DeliveryRecord::CSV_HEADER);
    assert!(lines[1].contains(",u1,2024-01-01,feishu,ok,"));
}

#[tokio::test]
async fn repeated_runs_reuse_the_cached_agenda() {
    let workspace = IsolatedWorkspace::new("idempotent");
    workspace.seed_user("u1", "UTC");
    workspace.seed_plan("u1", DATE, "- ship it");

    // One scripted response only: a second generation call would fail.
    let generator = Arc::new(ScriptedGenerator::new(vec![Ok(CANONICAL_JSON.to_string())]));
    let notifier = Arc::new(CapturingNotifier::new());
    let pipeline = pipeline_over(&workspace, generator.clone(), notifier.clone());
    let directory = FsUserDirectory::new(workspace.root());

    for _ in 0..2 {
        let summary = run_batch(pipeline.clone(), &directory, in_window_now())
            .await
            .expect("batch runs");
        assert_eq!(summary.delivered(), 1);
    }

    assert_eq!(generator.request_count().await, 1);
    let sent = notifier.sent();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].1, sent[1].1);

    // Each attempt is ledgered even when the agenda came from the cache.
    assert_eq!(workspace.ledger_lines().len(), 3);
}

#[tokio::test]
async fn freeform_fallback_sends_plain_text_without_persisting() {
    let workspace = IsolatedWorkspace::new("freeform");
    workspace.seed_user("u1", "UTC");
    workspace.seed_plan("u1", DATE, "- wing it");

    let generator = Arc::new(ScriptedGenerator::new(vec![
        Ok("I could not produce structured output.".to_string()),
        Ok("Good morning! Review until eleven, then retro.".to_string()),
    ]));
    let notifier = Arc::new(CapturingNotifier::new());
    let pipeline = pipeline_over(&workspace, generator.clone(), notifier.clone());
    let directory = FsUserDirectory::new(workspace.root());

    let summary = run_batch(pipeline, &directory, in_window_now())
        .await
        .expect("batch runs");

    assert_eq!(summary.delivered(), 1);
    assert!(!workspace.agenda_path("u1", DATE).exists());

    let sent = notifier.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].1, "Good morning! Review until eleven, then retro.");
}

#[tokio::test]
async fn generation_outage_is_ledgered_and_nothing_is_sent() {
    let workspace = IsolatedWorkspace::new("outage");
    workspace.seed_user("u1", "UTC");
    workspace.seed_plan("u1", DATE, "- anything");

    let generator = Arc::new(ScriptedGenerator::new(vec![
        Err(GenerateError::HttpStatus {
            status: 503,
            body: "overloaded".to_string(),
        }),
        Err(GenerateError::HttpStatus {
            status: 503,
            body: "overloaded".to_string(),
        }),
    ]));
    let notifier = Arc::new(CapturingNotifier::new());
    let pipeline = pipeline_over(&workspace, generator.clone(), notifier.clone());
    let directory = FsUserDirectory::new(workspace.root());

    let summary = run_batch(pipeline, &directory, in_window_now())
        .await
        .expect("batch runs");

    assert_eq!(summary.delivered(), 0);
    assert!(notifier.sent().is_empty());

    let lines = workspace.ledger_lines();
    assert_eq!(lines.len(), 2);
    assert!(lines[1].contains(",fail,"));
    assert!(lines[1].contains("fallback_error:"));
}

#[tokio::test]
async fn out_of_window_batch_leaves_no_trace() {
    let workspace = IsolatedWorkspace::new("window");
    workspace.seed_user("u1", "UTC");
    workspace.seed_plan("u1", DATE, "- anything");

    let generator = Arc::new(ScriptedGenerator::new(Vec::new()));
    let notifier = Arc::new(CapturingNotifier::new());
    let pipeline = pipeline_over(&workspace, generator.clone(), notifier.clone());
    let directory = FsUserDirectory::new(workspace.root());

    let noon = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
    let summary = run_batch(pipeline, &directory, noon)
        .await
        .expect("batch runs");

    assert_eq!(summary.skipped(), 1);
    assert_eq!(generator.request_count().await, 0);
    assert!(notifier.sent().is_empty());
    assert!(workspace.ledger_lines().is_empty());
}

#[tokio::test]
async fn planless_user_does_not_block_a_sibling() {
    let workspace = IsolatedWorkspace::new("siblings");
    workspace.seed_user("u1", "UTC");
    workspace.seed_user("u2", "UTC");
    workspace.seed_plan("u1", DATE, "- ship it");

    let generator = Arc::new(ScriptedGenerator::new(vec![Ok(CANONICAL_JSON.to_string())]));
    let notifier = Arc::new(CapturingNotifier::new());
    let pipeline = pipeline_over(&workspace, generator.clone(), notifier.clone());
    let directory = FsUserDirectory::new(workspace.root());

    let summary = run_batch(pipeline, &directory, in_window_now())
        .await
        .expect("batch runs");

    assert_eq!(summary.outcomes.len(), 2);
    assert_eq!(summary.delivered(), 1);

    let lines = workspace.ledger_lines();
    assert_eq!(lines.len(), 3);
    let body = lines[1..].join("\n");
    assert!(body.contains(",u1,2024-01-01,feishu,ok,"));
    assert!(body.contains(",u2,2024-01-01,feishu,fail,no_plan_md"));
}
