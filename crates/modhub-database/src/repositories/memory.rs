//! In-memory plugin repository.
//!
//! Same semantics as the PostgreSQL repository (unique aliases, partial
//! updates, readiness). Used by tests and by tooling that runs without a
//! database.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use modhub_core::error::AppError;
use modhub_core::result::AppResult;
use modhub_core::types::PluginId;
use modhub_entity::plugin::{CreatePlugin, PluginRecord, UpdatePlugin};

use super::PluginRepository;

/// Plugin records held in process memory.
#[derive(Debug)]
pub struct MemoryPluginRepository {
    /// Records in insertion order.
    records: RwLock<Vec<PluginRecord>>,
    /// Reported by `is_ready`.
    ready: AtomicBool,
    /// When set, every write fails.
    read_only: AtomicBool,
}

impl MemoryPluginRepository {
    /// Creates an empty, ready repository.
    pub fn new() -> Self {
        Self {
            records: RwLock::new(Vec::new()),
            ready: AtomicBool::new(true),
            read_only: AtomicBool::new(false),
        }
    }

    /// Creates a ready repository pre-populated with records.
    pub fn with_records(records: Vec<PluginRecord>) -> Self {
        Self {
            records: RwLock::new(records),
            ..Self::new()
        }
    }

    /// Simulate the backend (dis)appearing.
    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::SeqCst);
    }

    /// Make every write fail, as a database without write access would.
    pub fn set_read_only(&self, read_only: bool) {
        self.read_only.store(read_only, Ordering::SeqCst);
    }

    /// Number of stored records.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Whether no record is stored.
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    fn check_writable(&self) -> AppResult<()> {
        if self.read_only.load(Ordering::SeqCst) {
            return Err(AppError::database("Plugin repository is read-only"));
        }
        Ok(())
    }
}

impl Default for MemoryPluginRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginRepository for MemoryPluginRepository {
    async fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    async fn find_all(&self) -> AppResult<Vec<PluginRecord>> {
        let mut records = self.records.read().await.clone();
        records.sort_by(|a, b| a.alias.cmp(&b.alias));
        Ok(records)
    }

    async fn find_by_alias(&self, alias: &str) -> AppResult<Option<PluginRecord>> {
        let records = self.records.read().await;
        Ok(records.iter().find(|r| r.alias == alias).cloned())
    }

    async fn find_by_id(&self, id: PluginId) -> AppResult<Option<PluginRecord>> {
        let records = self.records.read().await;
        Ok(records.iter().find(|r| r.id == id).cloned())
    }

    async fn create(&self, data: &CreatePlugin) -> AppResult<PluginRecord> {
        self.check_writable()?;
        let mut records = self.records.write().await;

        if records.iter().any(|r| r.alias == data.alias) {
            return Err(AppError::conflict(format!(
                "Plugin '{}' already exists",
                data.alias
            )));
        }

        let now = Utc::now();
        let record = PluginRecord {
            id: PluginId::new(),
            alias: data.alias.clone(),
            enabled: data.enabled,
            installed: data.installed,
            installed_version: data.installed_version.clone(),
            created_at: now,
            updated_at: now,
        };
        records.push(record.clone());
        Ok(record)
    }

    async fn update(&self, id: PluginId, data: &UpdatePlugin) -> AppResult<Option<PluginRecord>> {
        self.check_writable()?;
        let mut records = self.records.write().await;

        Ok(records.iter_mut().find(|r| r.id == id).map(|record| {
            record.apply(data);
            record.clone()
        }))
    }

    async fn delete(&self, id: PluginId) -> AppResult<bool> {
        self.check_writable()?;
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|r| r.id != id);
        Ok(records.len() < before)
    }
}
