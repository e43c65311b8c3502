//! Response DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use modhub_entity::plugin::AutoloadType;
use modhub_plugin::{AutoloadChange, Catalog, PluginDescriptor, ScanConflict};

/// Standard success response wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T: Serialize> {
    /// Whether the request was successful.
    pub success: bool,
    /// Response data.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Creates a successful response.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// One plugin as shown to API clients.
#[derive(Debug, Clone, Serialize)]
pub struct PluginResponse {
    pub id: Option<String>,
    pub alias: String,
    pub namespace: String,
    pub autoload: AutoloadType,
    pub name: Option<String>,
    pub description: Option<String>,
    pub version: Option<String>,
    pub author: Option<String>,
    pub enabled: bool,
    pub installed: bool,
    pub installed_version: Option<String>,
    pub manifest_path: String,
}

impl From<&PluginDescriptor> for PluginResponse {
    fn from(p: &PluginDescriptor) -> Self {
        Self {
            id: p.id.map(|id| id.to_string()),
            alias: p.alias.clone(),
            namespace: p.namespace.clone(),
            autoload: p.autoload_type,
            name: p.name.clone(),
            description: p.description.clone(),
            version: p.version.clone(),
            author: p.author.clone(),
            enabled: p.enabled,
            installed: p.installed,
            installed_version: p.installed_version.clone(),
            manifest_path: p.manifest_path.display().to_string(),
        }
    }
}

/// Catalog listing.
#[derive(Debug, Clone, Serialize)]
pub struct PluginListResponse {
    pub plugins: Vec<PluginResponse>,
    /// Directories skipped for duplicate identities.
    pub conflicts: Vec<ScanConflict>,
    /// Whether plugin state came from the database.
    pub persisted: bool,
}

impl PluginListResponse {
    pub fn new(catalog: &Catalog, persisted: bool) -> Self {
        Self {
            plugins: catalog.iter().map(PluginResponse::from).collect(),
            conflicts: catalog.conflicts().to_vec(),
            persisted,
        }
    }
}

/// Result of `POST /api/plugins/{alias}/status/{status}`.
#[derive(Debug, Clone, Serialize)]
pub struct StatusChangeResponse {
    pub alias: String,
    pub enabled: bool,
    pub autoload: AutoloadChange,
    /// Whether the autoload refresh command ran successfully.
    pub autoload_refreshed: bool,
}

/// Simple message response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Overall status.
    pub status: String,
    /// Version.
    pub version: String,
    /// `connected`, `unreachable`, or `disabled`.
    pub database: String,
    /// Server time.
    pub timestamp: DateTime<Utc>,
}
