use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::SystemTime;

use anyhow::{Context, Result};
use async_trait::async_trait;

use dawn_core::write_text_atomic;
use dawn_schema::Agenda;

use crate::csv_codec::parse_line;
use crate::{AgendaCache, DeliveryLedger, DeliveryRecord, PlanSource, User, UserDirectory};

const USERS_FILE: &str = "users.csv";
const PLANS_DIR: &str = "plans";
const AGENDAS_DIR: &str = "agendas";
const DELIVERIES_FILE: &str = "deliveries.csv";

const DEFAULT_TIMEZONE: &str = "Asia/Shanghai";

fn non_empty(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// `users.csv` reader. Rows with a blank id or `active` other than `true`
/// are skipped; the timezone falls back to the service default.
#[derive(Debug, Clone)]
pub struct FsUserDirectory {
    path: PathBuf,
}

impl FsUserDirectory {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join(USERS_FILE),
        }
    }
}

#[async_trait]
impl UserDirectory for FsUserDirectory {
    async fn load_active_users(&self) -> Result<Vec<User>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let raw = fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read {}", self.path.display()))?;

        let mut lines = raw.lines();
        let Some(header) = lines.next() else {
            return Ok(Vec::new());
        };
        let columns: HashMap<String, usize> = parse_line(header)
            .into_iter()
            .enumerate()
            .map(|(index, name)| (name.trim().to_string(), index))
            .collect();
        let field = |fields: &[String], name: &str| -> String {
            columns
                .get(name)
                .and_then(|&index| fields.get(index))
                .map(|value| value.trim().to_string())
                .unwrap_or_default()
        };

        let mut users = Vec::new();
        for line in lines {
            if line.trim().is_empty() {
                continue;
            }
            let fields = parse_line(line);
            let id = field(&fields, "public_id");
            if id.is_empty() {
                continue;
            }
            if !field(&fields, "active").eq_ignore_ascii_case("true") {
                continue;
            }
            users.push(User {
                id,
                timezone: non_empty(&field(&fields, "timezone"))
                    .unwrap_or_else(|| DEFAULT_TIMEZONE.to_string()),
                endpoint: field(&fields, "feishu_webhook"),
                signing_secret: non_empty(&field(&fields, "feishu_secret")),
                preferences: field(&fields, "prefs"),
            });
        }
        Ok(users)
    }
}

/// Plan document resolver over `plans/{id}.{label}.md` files.
///
/// Prefers the newest plan whose label starts with the target date, then
/// falls back to the newest plan for the user regardless of date.
#[derive(Debug, Clone)]
pub struct FsPlanSource {
    plans_dir: PathBuf,
}

impl FsPlanSource {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            plans_dir: data_dir.join(PLANS_DIR),
        }
    }

    fn newest_matching(&self, user_id: &str, date_prefix: Option<&str>) -> Option<PathBuf> {
        let prefix = format!("{user_id}.");
        let entries = fs::read_dir(&self.plans_dir).ok()?;

        let mut newest: Option<(SystemTime, PathBuf)> = None;
        for entry in entries.flatten() {
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            let Some(label) = name.strip_prefix(&prefix) else {
                continue;
            };
            let Some(label) = label.strip_suffix(".md") else {
                continue;
            };
            if let Some(date_prefix) = date_prefix {
                if !label.starts_with(date_prefix) {
                    continue;
                }
            }
            let Ok(modified) = entry.metadata().and_then(|meta| meta.modified()) else {
                continue;
            };
            if newest
                .as_ref()
                .map(|(best, _)| modified > *best)
                .unwrap_or(true)
            {
                newest = Some((modified, entry.path()));
            }
        }
        newest.map(|(_, path)| path)
    }
}

#[async_trait]
impl PlanSource for FsPlanSource {
    async fn resolve(&self, user_id: &str, target_date: &str) -> Result<Option<String>> {
        let path = self
            .newest_matching(user_id, Some(target_date))
            .or_else(|| self.newest_matching(user_id, None));
        let Some(path) = path else {
            return Ok(None);
        };
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(error) => {
                tracing::warn!(path = %path.display(), %error, "failed to read plan document");
                Ok(None)
            }
        }
    }
}

/// Agenda cache at `agendas/{date}/{id}.json`, written atomically so a
/// concurrent reader never sees a partial agenda.
#[derive(Debug, Clone)]
pub struct FsAgendaCache {
    agendas_dir: PathBuf,
}

impl FsAgendaCache {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            agendas_dir: data_dir.join(AGENDAS_DIR),
        }
    }

    fn agenda_path(&self, user_id: &str, date: &str) -> PathBuf {
        self.agendas_dir.join(date).join(format!("{user_id}.json"))
    }
}

#[async_trait]
impl AgendaCache for FsAgendaCache {
    async fn get(&self, user_id: &str, date: &str) -> Result<Option<Agenda>> {
        let path = self.agenda_path(user_id, date);
        let Ok(raw) = fs::read_to_string(&path) else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(agenda) => Ok(Some(agenda)),
            Err(error) => {
                // A corrupt cache file reads as a miss; regeneration will
                // overwrite it.
                tracing::warn!(path = %path.display(), %error, "unreadable cached agenda");
                Ok(None)
            }
        }
    }

    async fn put(&self, user_id: &str, date: &str, agenda: &Agenda) -> Result<()> {
        let path = self.agenda_path(user_id, date);
        let raw = serde_json::to_string_pretty(agenda).context("failed to serialize agenda")?;
        write_text_atomic(&path, &raw)
    }
}

/// Append-only `deliveries.csv` ledger. Each append is a single atomic
/// write; a process-level lock keeps concurrent units from interleaving.
#[derive(Debug)]
pub struct FsDeliveryLedger {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FsDeliveryLedger {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join(DELIVERIES_FILE),
            lock: Mutex::new(()),
        }
    }
}

#[async_trait]
impl DeliveryLedger for FsDeliveryLedger {
    async fn append(&self, record: &DeliveryRecord) -> Result<()> {
        let _guard = self.lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let need_header = fs::metadata(&self.path).map(|meta| meta.len() == 0).unwrap_or(true);

        let mut chunk = String::new();
        if need_header {
            chunk.push_str(DeliveryRecord::CSV_HEADER);
            chunk.push('\n');
        }
        chunk.push_str(&record.to_csv_line());
        chunk.push('\n');

        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("failed to open {}", self.path.display()))?;
        file.write_all(chunk.as_bytes())
            .with_context(|| format!("failed to append to {}", self.path.display()))?;
        Ok(())
    }
}
