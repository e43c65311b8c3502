//! Plugin manifest parsing and the reconciled plugin descriptor.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use modhub_core::error::AppError;
use modhub_core::result::AppResult;
use modhub_core::types::PluginId;
use modhub_entity::plugin::{AutoloadType, PluginRecord};

/// Separator between namespace segments.
pub const NAMESPACE_SEPARATOR: char = '\\';

/// Contents of a plugin's `module.json`.
///
/// Only `alias` and `namespace` are required. Unknown keys are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ModuleManifest {
    /// Stable short identifier.
    pub alias: String,
    /// Code namespace the plugin occupies.
    pub namespace: String,
    /// Autoload strategy, `psr-4` when absent.
    #[serde(default)]
    pub autoload: AutoloadType,
    /// Display name.
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,
    /// Short description.
    #[serde(default, deserialize_with = "lenient_string")]
    pub description: Option<String>,
    /// Version the plugin ships.
    #[serde(default, deserialize_with = "lenient_string")]
    pub version: Option<String>,
    /// Author or maintainer.
    #[serde(default, deserialize_with = "lenient_string")]
    pub author: Option<String>,
}

impl ModuleManifest {
    /// Parse and validate manifest text.
    pub fn parse(text: &str) -> AppResult<Self> {
        let value: Value = serde_json::from_str(text)?;
        if !value.is_object() {
            return Err(AppError::validation("Plugin manifest must be a JSON object"));
        }

        let mut manifest: Self = serde_json::from_value(value)?;
        manifest.alias = manifest.alias.trim().to_string();
        manifest.namespace = manifest.namespace.trim().to_string();

        if manifest.alias.is_empty() {
            return Err(AppError::validation("Plugin manifest has an empty 'alias'"));
        }
        if manifest.namespace.trim_matches(NAMESPACE_SEPARATOR).is_empty() {
            return Err(AppError::validation(
                "Plugin manifest has an empty 'namespace'",
            ));
        }

        Ok(manifest)
    }
}

/// Accept strings and numbers, drop anything else.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// Ensure a namespace ends with exactly one separator.
pub fn normalize_namespace(namespace: &str) -> String {
    let trimmed = namespace.trim().trim_end_matches(NAMESPACE_SEPARATOR);
    format!("{trimmed}{NAMESPACE_SEPARATOR}")
}

/// A discovered plugin merged with its persisted state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginDescriptor {
    /// Stable short identifier.
    pub alias: String,
    /// Code namespace, as written in the manifest.
    pub namespace: String,
    /// Autoload strategy.
    pub autoload_type: AutoloadType,
    /// Location of the plugin's `module.json`.
    pub manifest_path: PathBuf,
    /// Display name.
    pub name: Option<String>,
    /// Short description.
    pub description: Option<String>,
    /// Version declared by the manifest.
    pub version: Option<String>,
    /// Author or maintainer.
    pub author: Option<String>,
    /// Persisted enabled flag.
    pub enabled: bool,
    /// Persisted installed flag.
    pub installed: bool,
    /// Persisted installed version.
    pub installed_version: Option<String>,
    /// Persisted record id, absent until a record exists.
    pub id: Option<PluginId>,
}

impl PluginDescriptor {
    /// Build a descriptor with default state from a parsed manifest.
    pub fn from_manifest(manifest: ModuleManifest, manifest_path: impl Into<PathBuf>) -> Self {
        Self {
            alias: manifest.alias,
            namespace: manifest.namespace,
            autoload_type: manifest.autoload,
            manifest_path: manifest_path.into(),
            name: manifest.name,
            description: manifest.description,
            version: manifest.version,
            author: manifest.author,
            enabled: false,
            installed: false,
            installed_version: None,
            id: None,
        }
    }

    /// Copy persisted flags onto this descriptor.
    pub fn merge_record(&mut self, record: &PluginRecord) {
        self.enabled = record.enabled;
        self.installed = record.installed;
        self.installed_version = record.installed_version.clone();
        self.id = Some(record.id);
    }

    /// Namespace with a trailing separator; catalog and autoload key.
    pub fn normalized_namespace(&self) -> String {
        normalize_namespace(&self.namespace)
    }

    /// Directory holding the manifest.
    pub fn directory(&self) -> &Path {
        self.manifest_path.parent().unwrap_or_else(|| Path::new(""))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_manifest_defaults_to_psr4() {
        let manifest = ModuleManifest::parse(r#"{"alias":"seo","namespace":"Acme\\Seo"}"#).unwrap();
        assert_eq!(manifest.alias, "seo");
        assert_eq!(manifest.namespace, "Acme\\Seo");
        assert_eq!(manifest.autoload, AutoloadType::Psr4);
        assert_eq!(manifest.version, None);
    }

    #[test]
    fn test_parse_keeps_optional_metadata() {
        let manifest = ModuleManifest::parse(
            r#"{
                "name": "Blog",
                "alias": "blog",
                "namespace": "Acme\\Blog\\",
                "autoload": "classmap",
                "version": 2,
                "author": {"name": "someone"},
                "require": {"php": ">=7.0"}
            }"#,
        )
        .unwrap();
        assert_eq!(manifest.autoload, AutoloadType::Classmap);
        assert_eq!(manifest.name.as_deref(), Some("Blog"));
        assert_eq!(manifest.version.as_deref(), Some("2"));
        assert_eq!(manifest.author, None);
    }

    #[test]
    fn test_parse_rejects_bad_manifests() {
        assert!(ModuleManifest::parse("not json").is_err());
        assert!(ModuleManifest::parse(r#"["seo", "Acme\\Seo"]"#).is_err());
        assert!(ModuleManifest::parse(r#"{"alias":"seo"}"#).is_err());
        assert!(ModuleManifest::parse(r#"{"alias":"  ","namespace":"Acme"}"#).is_err());
        assert!(ModuleManifest::parse(r#"{"alias":"seo","namespace":"\\"}"#).is_err());
        assert!(ModuleManifest::parse(r#"{"alias":"seo","namespace":"A","autoload":"psr-9"}"#).is_err());
    }

    #[test]
    fn test_normalize_namespace() {
        assert_eq!(normalize_namespace("Acme\\Foo"), "Acme\\Foo\\");
        assert_eq!(normalize_namespace("Acme\\Foo\\"), "Acme\\Foo\\");
        assert_eq!(normalize_namespace("Acme\\Foo\\\\"), "Acme\\Foo\\");
    }

    #[test]
    fn test_directory_of_relative_manifest() {
        let manifest = ModuleManifest::parse(r#"{"alias":"seo","namespace":"Acme\\Seo"}"#).unwrap();
        let descriptor = PluginDescriptor::from_manifest(manifest, "plugins/seo/module.json");
        assert_eq!(descriptor.directory(), Path::new("plugins/seo"));
        assert!(!descriptor.enabled);
        assert!(descriptor.id.is_none());
    }
}
