//! Rewrites the `autoload` section of the host's `composer.json`.
//!
//! Enabling a plugin registers its `src` directory under the plugin's
//! namespace (PSR-4/PSR-0) or appends it to the path list (classmap/files).
//! Disabling removes exactly that entry. All other content, including key
//! order, is preserved.

use std::io::ErrorKind as IoErrorKind;
use std::path::{Component, Path, PathBuf};

use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::{Map, Value};
use tracing::{debug, info};

use modhub_core::config::PluginConfig;
use modhub_core::error::{AppError, ErrorKind};
use modhub_core::result::AppResult;
use modhub_entity::plugin::AutoloadType;

use super::lock::{ManifestLock, write_atomic};
use crate::descriptor::{NAMESPACE_SEPARATOR, PluginDescriptor};

const AUTOLOAD_KEY: &str = "autoload";
const SOURCE_DIR: &str = "src";

/// What a rewrite did to the manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "change", rename_all = "snake_case")]
pub enum AutoloadChange {
    /// Entry registered.
    Added {
        autoload_type: AutoloadType,
        path: String,
    },
    /// Entry removed.
    Removed {
        autoload_type: AutoloadType,
        path: String,
    },
    /// Manifest already in the requested state; nothing written.
    Unchanged,
}

impl AutoloadChange {
    pub fn is_changed(&self) -> bool {
        !matches!(self, Self::Unchanged)
    }
}

/// The host application's autoload manifest.
#[derive(Debug, Clone)]
pub struct AutoloadManifest {
    path: PathBuf,
    app_root: PathBuf,
}

impl AutoloadManifest {
    /// `path` is the manifest file; entries are written relative to `app_root`.
    pub fn new(path: impl Into<PathBuf>, app_root: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            app_root: app_root.into(),
        }
    }

    pub fn from_config(config: &PluginConfig) -> Self {
        Self::new(config.autoload_manifest_path(), config.app_root())
    }

    /// Manifest file location.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Source path registered for a plugin, e.g. `plugins/seo/src`.
    pub fn relative_source_path(&self, descriptor: &PluginDescriptor) -> String {
        // Relative manifest locations are relative to the application root.
        let dir = self.app_root.join(descriptor.directory());
        let absolute = |p: &Path| std::path::absolute(p).unwrap_or_else(|_| p.to_path_buf());
        let dir_abs = absolute(&dir);
        let root_abs = absolute(&self.app_root);

        let relative = dir_abs
            .strip_prefix(&root_abs)
            .map(Path::to_path_buf)
            .unwrap_or(dir_abs);

        let mut parts: Vec<String> = relative
            .components()
            .filter_map(|c| match c {
                Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
                Component::RootDir => Some(String::new()),
                _ => None,
            })
            .collect();
        parts.push(SOURCE_DIR.to_string());
        parts.join("/")
    }

    /// Parse the manifest.
    pub async fn read(&self) -> AppResult<Value> {
        let text = match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => text,
            Err(e) if e.kind() == IoErrorKind::NotFound => {
                return Err(AppError::with_source(
                    ErrorKind::Storage,
                    format!("Autoload manifest {} does not exist", self.path.display()),
                    e,
                ));
            }
            Err(e) => {
                return Err(AppError::with_source(
                    ErrorKind::Storage,
                    format!("Failed to read {}", self.path.display()),
                    e,
                ));
            }
        };

        serde_json::from_str(&text).map_err(|e| {
            AppError::with_source(
                ErrorKind::Validation,
                format!("{} is not valid JSON", self.path.display()),
                e,
            )
        })
    }

    /// Register (`removing == false`) or unregister a plugin's autoload entry.
    ///
    /// Holds the manifest lock for the whole read-modify-write. An unchanged
    /// document is not written back.
    pub async fn rewrite(
        &self,
        descriptor: &PluginDescriptor,
        removing: bool,
    ) -> AppResult<AutoloadChange> {
        if descriptor
            .namespace
            .trim()
            .trim_matches(NAMESPACE_SEPARATOR)
            .is_empty()
        {
            debug!(alias = %descriptor.alias, "Plugin has no namespace, autoload untouched");
            return Ok(AutoloadChange::Unchanged);
        }

        let _lock = ManifestLock::acquire(&self.path).await?;

        let mut document = self.read().await?;
        let path = self.relative_source_path(descriptor);
        let namespace = descriptor.normalized_namespace();

        let changed = apply_entry(
            &mut document,
            descriptor.autoload_type,
            &namespace,
            &path,
            removing,
        )?;

        if !changed {
            debug!(
                alias = %descriptor.alias,
                removing,
                "Autoload manifest already up to date"
            );
            return Ok(AutoloadChange::Unchanged);
        }

        write_atomic(&self.path, &render(&document)?).await?;

        info!(
            alias = %descriptor.alias,
            autoload_type = %descriptor.autoload_type,
            path = %path,
            removing,
            "Autoload manifest updated"
        );

        let autoload_type = descriptor.autoload_type;
        Ok(if removing {
            AutoloadChange::Removed {
                autoload_type,
                path,
            }
        } else {
            AutoloadChange::Added {
                autoload_type,
                path,
            }
        })
    }
}

/// Add or remove one autoload entry in a parsed manifest.
///
/// Returns whether the document changed. Sections of the wrong shape are
/// rejected rather than overwritten.
pub fn apply_entry(
    document: &mut Value,
    autoload_type: AutoloadType,
    namespace: &str,
    path: &str,
    removing: bool,
) -> AppResult<bool> {
    let root = document
        .as_object_mut()
        .ok_or_else(|| AppError::validation("Autoload manifest must be a JSON object"))?;

    if removing && !root.contains_key(AUTOLOAD_KEY) {
        return Ok(false);
    }
    let autoload = root
        .entry(AUTOLOAD_KEY)
        .or_insert_with(|| Value::Object(Map::new()))
        .as_object_mut()
        .ok_or_else(|| AppError::validation("'autoload' must be a JSON object"))?;

    let section_key = autoload_type.as_str();
    if removing && !autoload.contains_key(section_key) {
        return Ok(false);
    }
    let section = autoload.entry(section_key).or_insert_with(|| {
        if autoload_type.is_flat() {
            Value::Array(Vec::new())
        } else {
            Value::Object(Map::new())
        }
    });

    if autoload_type.is_flat() {
        let entries = section.as_array_mut().ok_or_else(|| {
            AppError::validation(format!("'autoload.{section_key}' must be a JSON array"))
        })?;
        let present = entries.iter().any(|v| v.as_str() == Some(path));

        if removing {
            entries.retain(|v| v.as_str() != Some(path));
            Ok(present)
        } else if present {
            Ok(false)
        } else {
            entries.push(Value::String(path.to_string()));
            Ok(true)
        }
    } else {
        let entries = section.as_object_mut().ok_or_else(|| {
            AppError::validation(format!("'autoload.{section_key}' must be a JSON object"))
        })?;

        if removing {
            Ok(entries.shift_remove(namespace).is_some())
        } else if entries.get(namespace).and_then(Value::as_str) == Some(path) {
            Ok(false)
        } else {
            entries.insert(namespace.to_string(), Value::String(path.to_string()));
            Ok(true)
        }
    }
}

/// Four-space indented JSON with a trailing newline, as composer writes it.
fn render(document: &Value) -> AppResult<Vec<u8>> {
    let mut buf = Vec::new();
    let mut serializer =
        serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
    document.serialize(&mut serializer)?;
    buf.push(b'\n');
    Ok(buf)
}
