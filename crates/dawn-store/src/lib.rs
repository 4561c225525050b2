//! Collaborator interfaces around the pipeline: user records, plan
//! documents, the per-(user, date) agenda cache, and the append-only
//! delivery ledger, plus filesystem implementations over the service's
//! data directory and in-memory implementations for tests.

mod csv_codec;
mod fs;
mod memory;
mod record;

use anyhow::Result;
use async_trait::async_trait;

use dawn_schema::Agenda;

pub use fs::{FsAgendaCache, FsDeliveryLedger, FsPlanSource, FsUserDirectory};
pub use memory::{MemoryAgendaCache, MemoryDeliveryLedger, MemoryPlanSource, MemoryUserDirectory};
pub use record::{DeliveryRecord, DeliveryStatus};

#[derive(Debug, Clone, PartialEq, Eq)]
/// One delivery target, loaded once per run and immutable afterwards.
pub struct User {
    /// Opaque stable identifier, unique across the directory.
    pub id: String,
    /// IANA timezone name, e.g. `Asia/Shanghai`.
    pub timezone: String,
    /// Webhook address messages are delivered to.
    pub endpoint: String,
    pub signing_secret: Option<String>,
    /// Opaque preference text passed through to prompts.
    pub preferences: String,
}

#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn load_active_users(&self) -> Result<Vec<User>>;
}

#[async_trait]
/// Plan document resolution: date-preferred with fallback to most recent.
pub trait PlanSource: Send + Sync {
    async fn resolve(&self, user_id: &str, target_date: &str) -> Result<Option<String>>;
}

#[async_trait]
/// Per-(user, date) idempotency store. Within one run the cache is read at
/// most once and written at most once per user.
pub trait AgendaCache: Send + Sync {
    async fn get(&self, user_id: &str, date: &str) -> Result<Option<Agenda>>;
    async fn put(&self, user_id: &str, date: &str, agenda: &Agenda) -> Result<()>;
}

#[async_trait]
/// Append-only outcome ledger; one record per delivery attempt, never
/// mutated or deleted.
pub trait DeliveryLedger: Send + Sync {
    async fn append(&self, record: &DeliveryRecord) -> Result<()>;
}
