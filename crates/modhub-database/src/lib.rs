//! # modhub-database
//!
//! PostgreSQL connection management, migrations, and the plugin state
//! repositories (PostgreSQL-backed and in-memory).

pub mod connection;
pub mod migration;
pub mod repositories;

pub use connection::DatabasePool;
pub use repositories::{MemoryPluginRepository, PgPluginRepository, PluginRepository};
