//! PostgreSQL plugin repository implementation.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;

use modhub_core::error::{AppError, ErrorKind};
use modhub_core::result::AppResult;
use modhub_core::types::PluginId;
use modhub_entity::plugin::{CreatePlugin, PluginRecord, UpdatePlugin};

use super::PluginRepository;

/// Repository for the `plugins` table.
#[derive(Debug, Clone)]
pub struct PgPluginRepository {
    pool: PgPool,
}

impl PgPluginRepository {
    /// Create a new plugin repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PluginRepository for PgPluginRepository {
    async fn is_ready(&self) -> bool {
        match sqlx::query_scalar::<_, bool>("SELECT to_regclass('plugins') IS NOT NULL")
            .fetch_one(&self.pool)
            .await
        {
            Ok(exists) => exists,
            Err(e) => {
                debug!(error = %e, "Plugin table readiness check failed");
                false
            }
        }
    }

    async fn find_all(&self) -> AppResult<Vec<PluginRecord>> {
        sqlx::query_as::<_, PluginRecord>("SELECT * FROM plugins ORDER BY alias ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list plugins", e))
    }

    async fn find_by_alias(&self, alias: &str) -> AppResult<Option<PluginRecord>> {
        sqlx::query_as::<_, PluginRecord>("SELECT * FROM plugins WHERE alias = $1")
            .bind(alias)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find plugin", e))
    }

    async fn find_by_id(&self, id: PluginId) -> AppResult<Option<PluginRecord>> {
        sqlx::query_as::<_, PluginRecord>("SELECT * FROM plugins WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find plugin", e))
    }

    async fn create(&self, data: &CreatePlugin) -> AppResult<PluginRecord> {
        sqlx::query_as::<_, PluginRecord>(
            "INSERT INTO plugins (id, alias, enabled, installed, installed_version) \
             VALUES ($1, $2, $3, $4, $5) RETURNING *",
        )
        .bind(PluginId::new())
        .bind(&data.alias)
        .bind(data.enabled)
        .bind(data.installed)
        .bind(&data.installed_version)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            let unique = e
                .as_database_error()
                .is_some_and(|db| db.is_unique_violation());
            if unique {
                AppError::with_source(
                    ErrorKind::Conflict,
                    format!("Plugin '{}' already exists", data.alias),
                    e,
                )
            } else {
                AppError::with_source(ErrorKind::Database, "Failed to create plugin", e)
            }
        })
    }

    async fn update(&self, id: PluginId, data: &UpdatePlugin) -> AppResult<Option<PluginRecord>> {
        let (set_version, version) = match &data.installed_version {
            Some(version) => (true, version.clone()),
            None => (false, None),
        };

        sqlx::query_as::<_, PluginRecord>(
            "UPDATE plugins SET \
                enabled = COALESCE($2, enabled), \
                installed = COALESCE($3, installed), \
                installed_version = CASE WHEN $4 THEN $5 ELSE installed_version END, \
                updated_at = NOW() \
             WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(data.enabled)
        .bind(data.installed)
        .bind(set_version)
        .bind(version)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to update plugin", e))
    }

    async fn delete(&self, id: PluginId) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM plugins WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to delete plugin", e))?;
        Ok(result.rows_affected() > 0)
    }
}
