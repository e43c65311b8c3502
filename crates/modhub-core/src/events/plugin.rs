//! Plugin lifecycle events.

use serde::{Deserialize, Serialize};

/// Fired after the persisted state of a plugin changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PluginEvent {
    /// A plugin was enabled.
    PluginEnabled {
        /// Plugin alias.
        alias: String,
    },
    /// A plugin was disabled.
    PluginDisabled {
        /// Plugin alias.
        alias: String,
    },
    /// A plugin's install command completed.
    PluginInstalled {
        /// Plugin alias.
        alias: String,
        /// Version recorded as installed, if the manifest declares one.
        version: Option<String>,
    },
    /// A plugin's uninstall command completed.
    PluginUninstalled {
        /// Plugin alias.
        alias: String,
    },
}

impl PluginEvent {
    /// Alias of the plugin the event is about.
    pub fn alias(&self) -> &str {
        match self {
            Self::PluginEnabled { alias }
            | Self::PluginDisabled { alias }
            | Self::PluginInstalled { alias, .. }
            | Self::PluginUninstalled { alias } => alias,
        }
    }

    /// Stable event name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::PluginEnabled { .. } => "plugin.enabled",
            Self::PluginDisabled { .. } => "plugin.disabled",
            Self::PluginInstalled { .. } => "plugin.installed",
            Self::PluginUninstalled { .. } => "plugin.uninstalled",
        }
    }
}
