//! Persisted plugin state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use modhub_core::types::PluginId;

/// A row of the `plugins` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct PluginRecord {
    /// Primary key.
    pub id: PluginId,
    /// Plugin alias (unique).
    pub alias: String,
    /// Whether the plugin is enabled.
    pub enabled: bool,
    /// Whether the plugin's install command has run.
    pub installed: bool,
    /// Version recorded by the last install.
    pub installed_version: Option<String>,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
    /// When the record was last updated.
    pub updated_at: DateTime<Utc>,
}

impl PluginRecord {
    /// Apply a partial update in place. The alias never changes.
    pub fn apply(&mut self, update: &UpdatePlugin) {
        if let Some(enabled) = update.enabled {
            self.enabled = enabled;
        }
        if let Some(installed) = update.installed {
            self.installed = installed;
        }
        if let Some(version) = &update.installed_version {
            self.installed_version = version.clone();
        }
        self.updated_at = Utc::now();
    }
}

/// Data required to create a new plugin record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatePlugin {
    /// Plugin alias.
    pub alias: String,
    /// Initial enabled flag.
    pub enabled: bool,
    /// Initial installed flag.
    pub installed: bool,
    /// Initial installed version.
    pub installed_version: Option<String>,
}

impl CreatePlugin {
    /// A freshly discovered plugin: disabled and not installed.
    pub fn discovered(alias: impl Into<String>) -> Self {
        Self {
            alias: alias.into(),
            enabled: false,
            installed: false,
            installed_version: None,
        }
    }

    /// Build a create request carrying the fields of a partial update.
    pub fn from_update(alias: impl Into<String>, update: &UpdatePlugin) -> Self {
        let mut data = Self::discovered(alias);
        if let Some(enabled) = update.enabled {
            data.enabled = enabled;
        }
        if let Some(installed) = update.installed {
            data.installed = installed;
        }
        if let Some(version) = &update.installed_version {
            data.installed_version = version.clone();
        }
        data
    }
}

/// Partial update of a plugin record. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdatePlugin {
    /// New enabled flag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    /// New installed flag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub installed: Option<bool>,
    /// New installed version; `Some(None)` clears it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub installed_version: Option<Option<String>>,
}

impl UpdatePlugin {
    /// Update only the enabled flag.
    pub fn enabled(enabled: bool) -> Self {
        Self {
            enabled: Some(enabled),
            ..Self::default()
        }
    }

    /// Mark installed with the given version.
    pub fn installed(version: Option<String>) -> Self {
        Self {
            installed: Some(true),
            installed_version: Some(version),
            ..Self::default()
        }
    }

    /// Mark uninstalled and clear the version.
    pub fn uninstalled() -> Self {
        Self {
            installed: Some(false),
            installed_version: Some(None),
            ..Self::default()
        }
    }

    /// Whether the update carries no changes.
    pub fn is_empty(&self) -> bool {
        self.enabled.is_none() && self.installed.is_none() && self.installed_version.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> PluginRecord {
        PluginRecord {
            id: PluginId::new(),
            alias: "seo".to_string(),
            enabled: false,
            installed: true,
            installed_version: Some("1.0.0".to_string()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_apply_only_touches_given_fields() {
        let mut rec = record();
        rec.apply(&UpdatePlugin::enabled(true));
        assert!(rec.enabled);
        assert!(rec.installed);
        assert_eq!(rec.installed_version.as_deref(), Some("1.0.0"));
    }

    #[test]
    fn test_uninstalled_clears_version() {
        let mut rec = record();
        rec.apply(&UpdatePlugin::uninstalled());
        assert!(!rec.installed);
        assert_eq!(rec.installed_version, None);
    }

    #[test]
    fn test_create_from_update() {
        let data = CreatePlugin::from_update("blog", &UpdatePlugin::enabled(true));
        assert_eq!(data.alias, "blog");
        assert!(data.enabled);
        assert!(!data.installed);
        assert!(UpdatePlugin::default().is_empty());
    }
}
