//! Plugin registry configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Placeholder substituted with the plugin alias in command templates.
pub const ALIAS_PLACEHOLDER: &str = "{alias}";

/// Plugin registry configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginConfig {
    /// Root of the host application. Autoload paths are written relative to it.
    #[serde(default = "default_app_root")]
    pub app_root: String,
    /// Directory containing one sub-directory per plugin. Relative paths are
    /// resolved against `app_root`.
    #[serde(default = "default_plugin_directory")]
    pub directory: String,
    /// Name of the per-plugin manifest file.
    #[serde(default = "default_manifest_file")]
    pub manifest_file: String,
    /// The application's autoload manifest. Relative paths are resolved
    /// against `app_root`.
    #[serde(default = "default_autoload_manifest")]
    pub autoload_manifest: String,
    /// Command run to install a plugin's dependencies.
    #[serde(default = "default_install_command")]
    pub install_command: Vec<String>,
    /// Command run to uninstall a plugin's dependencies.
    #[serde(default = "default_uninstall_command")]
    pub uninstall_command: Vec<String>,
    /// Command run after the autoload manifest changed. Empty disables it.
    #[serde(default = "default_refresh_autoload_command")]
    pub refresh_autoload_command: Vec<String>,
    /// Upper bound for any external command, in seconds.
    #[serde(default = "default_command_timeout")]
    pub command_timeout_seconds: u64,
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            app_root: default_app_root(),
            directory: default_plugin_directory(),
            manifest_file: default_manifest_file(),
            autoload_manifest: default_autoload_manifest(),
            install_command: default_install_command(),
            uninstall_command: default_uninstall_command(),
            refresh_autoload_command: default_refresh_autoload_command(),
            command_timeout_seconds: default_command_timeout(),
        }
    }
}

impl PluginConfig {
    /// Absolute-or-relative application root.
    pub fn app_root(&self) -> PathBuf {
        PathBuf::from(&self.app_root)
    }

    /// Directory that is scanned for plugins.
    pub fn plugins_root(&self) -> PathBuf {
        resolve(&self.app_root(), &self.directory)
    }

    /// Location of the application's autoload manifest.
    pub fn autoload_manifest_path(&self) -> PathBuf {
        resolve(&self.app_root(), &self.autoload_manifest)
    }
}

fn resolve(root: &Path, path: &str) -> PathBuf {
    let candidate = Path::new(path);
    if candidate.is_absolute() {
        candidate.to_path_buf()
    } else {
        root.join(candidate)
    }
}

fn default_app_root() -> String {
    ".".to_string()
}

fn default_plugin_directory() -> String {
    "plugins".to_string()
}

fn default_manifest_file() -> String {
    "module.json".to_string()
}

fn default_autoload_manifest() -> String {
    "composer.json".to_string()
}

fn default_install_command() -> Vec<String> {
    vec![
        "php".to_string(),
        "artisan".to_string(),
        "module:install".to_string(),
        ALIAS_PLACEHOLDER.to_string(),
    ]
}

fn default_uninstall_command() -> Vec<String> {
    vec![
        "php".to_string(),
        "artisan".to_string(),
        "module:uninstall".to_string(),
        ALIAS_PLACEHOLDER.to_string(),
    ]
}

fn default_refresh_autoload_command() -> Vec<String> {
    vec!["composer".to_string(), "dump-autoload".to_string()]
}

fn default_command_timeout() -> u64 {
    300
}
