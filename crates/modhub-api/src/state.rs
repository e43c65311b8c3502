//! Application state shared across all handlers.

use std::sync::Arc;

use tokio::sync::Mutex;

use modhub_core::config::AppConfig;
use modhub_database::DatabasePool;
use modhub_plugin::{PluginInstaller, PluginStore};

/// Passed to every Axum handler via `State<AppState>`.
///
/// All fields are cheap to clone. The plugin store sits behind an async
/// mutex: registry operations run one at a time.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<AppConfig>,
    /// Reconciled plugin catalog and its side effects
    pub store: Arc<Mutex<PluginStore>>,
    /// Install/uninstall/autoload-refresh commands
    pub installer: Arc<PluginInstaller>,
    /// Database pool, absent when running without persistence
    pub db_pool: Option<DatabasePool>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        store: PluginStore,
        installer: PluginInstaller,
        db_pool: Option<DatabasePool>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            store: Arc::new(Mutex::new(store)),
            installer: Arc::new(installer),
            db_pool,
        }
    }
}
