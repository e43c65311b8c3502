//! Plugin directory scanner.
//!
//! Every immediate subdirectory of the plugins root that contains a valid
//! manifest yields one descriptor. Subdirectories are visited in name order
//! so the resulting catalog order is stable across platforms.

use std::collections::HashMap;
use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use modhub_core::error::{AppError, ErrorKind};
use modhub_core::result::AppResult;

use crate::descriptor::{ModuleManifest, PluginDescriptor};

/// Which identity two plugin directories collided on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictKind {
    /// Two manifests declared the same namespace.
    Namespace,
    /// Two manifests declared the same alias.
    Alias,
}

/// A plugin directory skipped because an earlier one claimed its identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanConflict {
    /// Colliding identity.
    pub kind: ConflictKind,
    /// The contested namespace or alias.
    pub key: String,
    /// Manifest that was kept.
    pub kept: PathBuf,
    /// Manifest that was skipped.
    pub skipped: PathBuf,
}

/// Result of one scan.
#[derive(Debug, Clone, Default)]
pub struct ScanReport {
    /// Valid plugins in directory-name order.
    pub descriptors: Vec<PluginDescriptor>,
    /// Directories dropped because of duplicate identities.
    pub conflicts: Vec<ScanConflict>,
}

/// Reads plugin manifests from a directory tree.
#[derive(Debug, Clone)]
pub struct PluginScanner {
    root: PathBuf,
    manifest_file: String,
}

impl PluginScanner {
    /// Creates a scanner over `root`, reading `manifest_file` in each subdirectory.
    pub fn new(root: impl Into<PathBuf>, manifest_file: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            manifest_file: manifest_file.into(),
        }
    }

    /// The plugins root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Scan the plugins root.
    ///
    /// A missing root yields an empty report. Unreadable or invalid
    /// manifests are logged and skipped.
    pub async fn scan(&self) -> AppResult<ScanReport> {
        let directories = match self.plugin_directories().await {
            Ok(dirs) => dirs,
            Err(e) if e.kind() == IoErrorKind::NotFound => {
                debug!(root = %self.root.display(), "Plugins root does not exist");
                return Ok(ScanReport::default());
            }
            Err(e) => {
                return Err(AppError::with_source(
                    ErrorKind::Storage,
                    format!("Failed to read plugins root {}", self.root.display()),
                    e,
                ));
            }
        };

        let mut report = ScanReport::default();
        let mut namespaces: HashMap<String, PathBuf> = HashMap::new();
        let mut aliases: HashMap<String, PathBuf> = HashMap::new();

        for dir in directories {
            let manifest_path = dir.join(&self.manifest_file);
            let Some(manifest) = self.read_manifest(&manifest_path).await else {
                continue;
            };

            let descriptor = PluginDescriptor::from_manifest(manifest, manifest_path);
            let namespace = descriptor.normalized_namespace();

            if let Some(kept) = namespaces.get(&namespace) {
                report.conflicts.push(conflict(ConflictKind::Namespace, namespace, kept, &descriptor));
                continue;
            }
            if let Some(kept) = aliases.get(&descriptor.alias) {
                report
                    .conflicts
                    .push(conflict(ConflictKind::Alias, descriptor.alias.clone(), kept, &descriptor));
                continue;
            }

            namespaces.insert(namespace, descriptor.manifest_path.clone());
            aliases.insert(descriptor.alias.clone(), descriptor.manifest_path.clone());
            report.descriptors.push(descriptor);
        }

        debug!(
            root = %self.root.display(),
            plugins = report.descriptors.len(),
            conflicts = report.conflicts.len(),
            "Plugin scan complete"
        );
        Ok(report)
    }

    /// Immediate subdirectories of the root, sorted by name.
    async fn plugin_directories(&self) -> std::io::Result<Vec<PathBuf>> {
        let mut entries = tokio::fs::read_dir(&self.root).await?;
        let mut dirs = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            // Follows symlinks so linked plugin checkouts are picked up.
            match tokio::fs::metadata(&path).await {
                Ok(meta) if meta.is_dir() => dirs.push(path),
                Ok(_) => {}
                Err(e) => debug!(path = %path.display(), error = %e, "Skipping unreadable entry"),
            }
        }

        dirs.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        Ok(dirs)
    }

    async fn read_manifest(&self, path: &Path) -> Option<ModuleManifest> {
        let text = match tokio::fs::read_to_string(path).await {
            Ok(text) => text,
            Err(e) if e.kind() == IoErrorKind::NotFound => {
                debug!(path = %path.display(), "Directory has no plugin manifest");
                return None;
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read plugin manifest");
                return None;
            }
        };

        match ModuleManifest::parse(&text) {
            Ok(manifest) => Some(manifest),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Ignoring invalid plugin manifest");
                None
            }
        }
    }
}

fn conflict(
    kind: ConflictKind,
    key: String,
    kept: &Path,
    skipped: &PluginDescriptor,
) -> ScanConflict {
    warn!(
        kind = ?kind,
        key = %key,
        kept = %kept.display(),
        skipped = %skipped.manifest_path.display(),
        "Duplicate plugin identity, skipping later directory"
    );
    ScanConflict {
        kind,
        key,
        kept: kept.to_path_buf(),
        skipped: skipped.manifest_path.clone(),
    }
}
