//! ModHub Server: plugin registry and activation API.
//!
//! Main entry point that wires all crates together and starts the server.

use std::sync::Arc;

use tracing_subscriber::{EnvFilter, fmt};

use modhub_core::config::{AppConfig, LogFormat};
use modhub_core::error::AppError;
use modhub_database::{DatabasePool, PgPluginRepository, PluginRepository};
use modhub_plugin::{EventDispatcher, ListenerRegistry, PluginInstaller, PluginStore};

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

/// Load configuration from file, environment overlay file, and variables
fn load_configuration() -> Result<AppConfig, AppError> {
    let config_path =
        std::env::var("MODHUB_CONFIG").unwrap_or_else(|_| "config/default.toml".to_string());
    let env = std::env::var("MODHUB_ENV").unwrap_or_else(|_| "development".to_string());

    AppConfig::load_layered(&config_path, Some(&env))
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format {
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        LogFormat::Pretty => {
            fmt().pretty().with_env_filter(filter).with_target(true).init();
        }
    }
}

/// Main server run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting ModHub v{}", env!("CARGO_PKG_VERSION"));

    // ── Step 1: Database connection + migrations ─────────────────
    let db_pool = DatabasePool::connect_optional(&config.database).await;

    if let Some(pool) = &db_pool {
        if config.database.run_migrations {
            modhub_database::migration::run_migrations(pool.pool()).await?;
        }
    } else {
        tracing::warn!("Running without a database; plugin state will not be persisted");
    }

    let repository = db_pool.as_ref().map(|pool| {
        Arc::new(PgPluginRepository::new(pool.pool().clone())) as Arc<dyn PluginRepository>
    });

    // ── Step 2: Plugin registry ──────────────────────────────────
    let listeners = Arc::new(ListenerRegistry::new());
    let dispatcher = Arc::new(EventDispatcher::new(Arc::clone(&listeners)));
    let mut store = PluginStore::from_config(&config.plugins, repository, dispatcher);

    let catalog = store.get_all().await?;
    tracing::info!(
        root = %config.plugins.plugins_root().display(),
        plugins = catalog.len(),
        conflicts = catalog.conflicts().len(),
        "Plugin catalog loaded"
    );

    let installer = PluginInstaller::from_config(&config.plugins);

    // ── Step 3: Build and start HTTP server ──────────────────────
    let addr = config.server.bind_address();
    let grace = config.server.shutdown_grace();
    let state = modhub_api::AppState::new(config, store, installer, db_pool.clone());
    let app = modhub_api::build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;

    tracing::info!("ModHub server listening on {}", addr);

    // ── Step 4: Graceful shutdown ────────────────────────────────
    let server = axum::serve(listener, app).with_graceful_shutdown(async {
        shutdown_signal().await;
        tracing::info!("Shutdown signal received, starting graceful shutdown...");
    });

    server
        .await
        .map_err(|e| AppError::internal(format!("Server error: {e}")))?;

    if let Some(pool) = db_pool {
        if tokio::time::timeout(grace, pool.close()).await.is_err() {
            tracing::warn!("Database pool did not close within the grace period");
        }
    }

    tracing::info!("ModHub server shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
