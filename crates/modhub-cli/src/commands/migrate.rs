//! `modhub migrate`.

use clap::{Args, Subcommand};

use modhub_core::error::AppError;
use modhub_database::DatabasePool;
use modhub_database::connection::mask_password;

use crate::output;

#[derive(Debug, Args)]
pub struct MigrateArgs {
    #[command(subcommand)]
    pub command: MigrateCommand,
}

#[derive(Debug, Subcommand)]
pub enum MigrateCommand {
    /// Create or upgrade the `plugins` table
    Run,
}

pub async fn execute(args: &MigrateArgs, config_path: &str) -> Result<(), AppError> {
    let config = super::load_config(config_path)?;

    // Unlike the plugin commands, migrations need a reachable database.
    let pool = DatabasePool::connect(&config.database).await?;

    let result = match &args.command {
        MigrateCommand::Run => modhub_database::migration::run_migrations(pool.pool()).await,
    };
    pool.close().await;
    result?;

    output::print_success(&format!(
        "Schema up to date on {}",
        mask_password(&config.database.url)
    ));
    Ok(())
}
