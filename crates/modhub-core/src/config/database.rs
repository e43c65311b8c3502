//! `[database]` section.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Where plugin flags are persisted. An unreachable database is tolerated:
/// the registry then reports default state.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    /// Also bounds the startup connection attempt.
    pub connect_timeout_seconds: u64,
    pub idle_timeout_seconds: u64,
    /// Apply pending migrations when the server starts.
    pub run_migrations: bool,
}

impl DatabaseConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_seconds)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_seconds)
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "postgres://localhost:5432/modhub".into(),
            max_connections: 5,
            min_connections: 0,
            connect_timeout_seconds: 5,
            idle_timeout_seconds: 300,
            run_migrations: true,
        }
    }
}
