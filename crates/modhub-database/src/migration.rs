//! Embedded schema migrations.

use sqlx::PgPool;
use sqlx::migrate::Migrator;
use tracing::info;

use modhub_core::error::{AppError, ErrorKind};
use modhub_core::result::AppResult;

static MIGRATOR: Migrator = sqlx::migrate!("../../migrations");

/// Apply every migration not yet recorded in `_sqlx_migrations`.
pub async fn run_migrations(pool: &PgPool) -> AppResult<()> {
    let known = MIGRATOR.iter().count();
    info!(migrations = known, "Applying database migrations");

    MIGRATOR.run(pool).await.map_err(|e| {
        AppError::with_source(ErrorKind::Database, format!("Migration failed: {e}"), e)
    })?;

    info!("Database schema up to date");
    Ok(())
}
