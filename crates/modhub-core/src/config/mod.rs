//! Application configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate. Each sub-module represents a logical configuration
//! section. Every field has a default so an empty file is a valid config.

pub mod app;
pub mod database;
pub mod logging;
pub mod plugin;

use std::path::Path;

use serde::{Deserialize, Serialize};

pub use self::app::{CorsConfig, ServerConfig};
pub use self::database::DatabaseConfig;
pub use self::logging::{LogFormat, LoggingConfig};
pub use self::plugin::{ALIAS_PLACEHOLDER, PluginConfig};

use crate::error::AppError;

/// Prefix for environment variable overrides, e.g. `MODHUB__SERVER__PORT`.
const ENV_PREFIX: &str = "MODHUB";

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database connection settings.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Plugin registry settings.
    #[serde(default)]
    pub plugins: PluginConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from a single TOML file plus environment overrides.
    ///
    /// A missing file is not an error; defaults apply.
    pub fn load(path: &str) -> Result<Self, AppError> {
        Self::load_layered(path, None)
    }

    /// Load the base file, an optional environment overlay file
    /// (`config/<env>.toml`), then variables prefixed with `MODHUB__`.
    pub fn load_layered(path: &str, env: Option<&str>) -> Result<Self, AppError> {
        let mut builder =
            config::Config::builder().add_source(config::File::with_name(path).required(false));

        if let Some(env) = env {
            let overlay = Path::new(path)
                .parent()
                .unwrap_or_else(|| Path::new("."))
                .join(format!("{env}.toml"));
            builder = builder.add_source(config::File::from(overlay).required(false));
        }

        let config = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_yields_defaults() {
        let config = AppConfig::load("does/not/exist.toml").expect("defaults");
        assert_eq!(config.plugins.directory, "plugins");
        assert_eq!(config.plugins.manifest_file, "module.json");
        assert_eq!(config.plugins.autoload_manifest, "composer.json");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_file_and_overlay_are_merged() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("default.toml");
        std::fs::write(
            &base,
            "[plugins]\napp_root = \"/srv/app\"\ndirectory = \"modules\"\n\n[server]\nport = 9000\n",
        )
        .unwrap();
        std::fs::write(dir.path().join("testing.toml"), "[server]\nport = 9100\n").unwrap();

        let config = AppConfig::load_layered(base.to_str().unwrap(), Some("testing")).unwrap();
        assert_eq!(config.server.port, 9100);
        assert_eq!(
            config.plugins.plugins_root(),
            std::path::PathBuf::from("/srv/app/modules")
        );
        assert_eq!(
            config.plugins.autoload_manifest_path(),
            std::path::PathBuf::from("/srv/app/composer.json")
        );
    }

    #[test]
    fn test_absolute_plugin_directory_is_kept() {
        let config = PluginConfig {
            directory: "/opt/plugins".to_string(),
            ..PluginConfig::default()
        };
        assert_eq!(config.plugins_root(), std::path::PathBuf::from("/opt/plugins"));
    }
}
