//! In-memory collaborator implementations used by pipeline tests and
//! dry runs.

use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;

use dawn_schema::Agenda;

use crate::{
    AgendaCache, DeliveryLedger, DeliveryRecord, PlanSource, User, UserDirectory,
};

#[derive(Debug, Default)]
pub struct MemoryUserDirectory {
    users: Vec<User>,
}

impl MemoryUserDirectory {
    pub fn new(users: Vec<User>) -> Self {
        Self { users }
    }
}

#[async_trait]
impl UserDirectory for MemoryUserDirectory {
    async fn load_active_users(&self) -> Result<Vec<User>> {
        Ok(self.users.clone())
    }
}

#[derive(Debug, Default)]
pub struct MemoryPlanSource {
    plans: HashMap<String, String>,
}

impl MemoryPlanSource {
    pub fn new(plans: HashMap<String, String>) -> Self {
        Self { plans }
    }

    pub fn with_plan(user_id: impl Into<String>, plan: impl Into<String>) -> Self {
        let mut plans = HashMap::new();
        plans.insert(user_id.into(), plan.into());
        Self { plans }
    }
}

#[async_trait]
impl PlanSource for MemoryPlanSource {
    async fn resolve(&self, user_id: &str, _target_date: &str) -> Result<Option<String>> {
        Ok(self.plans.get(user_id).cloned())
    }
}

#[derive(Debug, Default)]
pub struct MemoryAgendaCache {
    agendas: Mutex<HashMap<(String, String), Agenda>>,
}

impl MemoryAgendaCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.agendas.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl AgendaCache for MemoryAgendaCache {
    async fn get(&self, user_id: &str, date: &str) -> Result<Option<Agenda>> {
        Ok(self
            .agendas
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(&(user_id.to_string(), date.to_string()))
            .cloned())
    }

    async fn put(&self, user_id: &str, date: &str, agenda: &Agenda) -> Result<()> {
        self.agendas
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert((user_id.to_string(), date.to_string()), agenda.clone());
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryDeliveryLedger {
    records: Mutex<Vec<DeliveryRecord>>,
}

impl MemoryDeliveryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<DeliveryRecord> {
        self.records.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).clone()
    }
}

#[async_trait]
impl DeliveryLedger for MemoryDeliveryLedger {
    async fn append(&self, record: &DeliveryRecord) -> Result<()> {
        self.records.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).push(record.clone());
        Ok(())
    }
}
