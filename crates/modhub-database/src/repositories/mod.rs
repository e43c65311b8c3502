//! Plugin state repositories.
//!
//! [`PluginRepository`] is the seam the plugin registry talks to. The
//! PostgreSQL implementation backs production; the in-memory one backs
//! tests and database-less tooling.

pub mod memory;
pub mod plugin;

use async_trait::async_trait;

use modhub_core::result::AppResult;
use modhub_core::types::PluginId;
use modhub_entity::plugin::{CreatePlugin, PluginRecord, UpdatePlugin};

pub use memory::MemoryPluginRepository;
pub use plugin::PgPluginRepository;

/// Access to persisted plugin flags.
#[async_trait]
pub trait PluginRepository: Send + Sync + std::fmt::Debug {
    /// Whether the backend is reachable and the `plugins` table exists.
    ///
    /// Never errors: an unreachable backend simply reports `false`.
    async fn is_ready(&self) -> bool;

    /// Load every plugin record.
    async fn find_all(&self) -> AppResult<Vec<PluginRecord>>;

    /// Find a record by its alias.
    async fn find_by_alias(&self, alias: &str) -> AppResult<Option<PluginRecord>>;

    /// Find a record by primary key.
    async fn find_by_id(&self, id: PluginId) -> AppResult<Option<PluginRecord>>;

    /// Insert a record. Fails with a conflict if the alias already exists.
    async fn create(&self, data: &CreatePlugin) -> AppResult<PluginRecord>;

    /// Apply a partial update. Returns `None` if no row has this id.
    async fn update(&self, id: PluginId, data: &UpdatePlugin) -> AppResult<Option<PluginRecord>>;

    /// Delete a record. Returns `true` if a row was removed.
    async fn delete(&self, id: PluginId) -> AppResult<bool>;

    /// Create-or-update keyed by persisted id.
    ///
    /// Without an id (or when the id no longer exists) the record is
    /// looked up by alias first so a concurrent create is updated rather
    /// than duplicated.
    async fn create_or_update(
        &self,
        id: Option<PluginId>,
        alias: &str,
        data: &UpdatePlugin,
    ) -> AppResult<PluginRecord> {
        if let Some(id) = id {
            if let Some(record) = self.update(id, data).await? {
                return Ok(record);
            }
        }

        if let Some(existing) = self.find_by_alias(alias).await? {
            if let Some(record) = self.update(existing.id, data).await? {
                return Ok(record);
            }
        }

        self.create(&CreatePlugin::from_update(alias, data)).await
    }
}
