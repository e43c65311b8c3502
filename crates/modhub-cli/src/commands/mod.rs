//! CLI command definitions and dispatch.

pub mod config;
pub mod migrate;
pub mod plugin;

use std::sync::Arc;

use clap::{Parser, Subcommand};

use modhub_core::config::AppConfig;
use modhub_core::error::AppError;
use modhub_database::{DatabasePool, PgPluginRepository, PluginRepository};
use modhub_plugin::{EventDispatcher, PluginStore};

use crate::output::OutputFormat;

/// ModHub: plugin registry administration
#[derive(Debug, Parser)]
#[command(name = "modhub", version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Plugin management
    Plugin(plugin::PluginArgs),
    /// Database migration management
    Migrate(migrate::MigrateArgs),
    /// Configuration management
    Config(config::ConfigArgs),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self) -> Result<(), AppError> {
        match &self.command {
            Commands::Plugin(args) => plugin::execute(args, &self.config, self.format).await,
            Commands::Migrate(args) => migrate::execute(args, &self.config).await,
            Commands::Config(args) => config::execute(args, &self.config, self.format).await,
        }
    }
}

/// Helper: load configuration from file
pub fn load_config(config_path: &str) -> Result<AppConfig, AppError> {
    AppConfig::load(config_path)
}

/// Helper: build a plugin store, persisting only when the database is reachable
pub async fn open_store(config: &AppConfig) -> (PluginStore, Option<DatabasePool>) {
    let pool = DatabasePool::connect_optional(&config.database).await;
    let repository = pool.as_ref().map(|pool| {
        Arc::new(PgPluginRepository::new(pool.pool().clone())) as Arc<dyn PluginRepository>
    });
    let store = PluginStore::from_config(
        &config.plugins,
        repository,
        Arc::new(EventDispatcher::default()),
    );
    (store, pool)
}
