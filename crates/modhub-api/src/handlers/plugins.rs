//! Plugin registry handlers.

use axum::Json;
use axum::extract::{Path, State};
use tracing::{info, warn};

use modhub_core::error::AppError;
use modhub_plugin::InstallOutcome;

use crate::dto::request::{AliasPath, StatusPath};
use crate::dto::response::{
    ApiResponse, PluginListResponse, PluginResponse, StatusChangeResponse,
};
use crate::error::ApiError;
use crate::state::AppState;

/// GET /api/plugins
pub async fn list_plugins(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<PluginListResponse>>, ApiError> {
    let mut store = state.store.lock().await;
    let catalog = store.get_all().await?.clone();
    Ok(Json(ApiResponse::ok(PluginListResponse::new(
        &catalog,
        store.is_backend_ready(),
    ))))
}

/// GET /api/plugins/{alias}
pub async fn get_plugin(
    State(state): State<AppState>,
    Path(AliasPath { alias }): Path<AliasPath>,
) -> Result<Json<ApiResponse<PluginResponse>>, ApiError> {
    let mut store = state.store.lock().await;
    let plugin = store
        .find_by_alias(&alias)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Plugin not found: {alias}")))?;
    Ok(Json(ApiResponse::ok(PluginResponse::from(&plugin))))
}

/// POST /api/plugins/{alias}/status/{status}
pub async fn change_status(
    State(state): State<AppState>,
    Path(StatusPath { alias, status }): Path<StatusPath>,
) -> Result<Json<ApiResponse<StatusChangeResponse>>, ApiError> {
    let enabled = status.0;
    let mut store = state.store.lock().await;

    let change = if enabled {
        store.enable(&alias).await?
    } else {
        store.disable(&alias).await?
    };

    // The state change already happened; a failed refresh is reported, not fatal.
    let autoload_refreshed = match state.installer.refresh_autoload().await {
        Ok(output) => output.is_some(),
        Err(e) => {
            warn!(alias = %alias, error = %e, "Autoload refresh failed");
            false
        }
    };

    info!(alias = %alias, enabled, "Plugin status changed via API");
    Ok(Json(ApiResponse::ok(StatusChangeResponse {
        alias,
        enabled,
        autoload: change,
        autoload_refreshed,
    })))
}

/// POST /api/plugins/{alias}/install
pub async fn install_plugin(
    State(state): State<AppState>,
    Path(AliasPath { alias }): Path<AliasPath>,
) -> Result<Json<ApiResponse<InstallOutcome>>, ApiError> {
    let mut store = state.store.lock().await;
    let outcome = state.installer.install(&mut store, &alias).await?;
    Ok(Json(ApiResponse::ok(outcome)))
}

/// POST /api/plugins/{alias}/uninstall
pub async fn uninstall_plugin(
    State(state): State<AppState>,
    Path(AliasPath { alias }): Path<AliasPath>,
) -> Result<Json<ApiResponse<InstallOutcome>>, ApiError> {
    let mut store = state.store.lock().await;
    let outcome = state.installer.uninstall(&mut store, &alias).await?;
    Ok(Json(ApiResponse::ok(outcome)))
}

/// POST /api/plugins/refresh
pub async fn refresh_plugins(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<PluginListResponse>>, ApiError> {
    let mut store = state.store.lock().await;
    let catalog = store.refresh().await?.clone();
    Ok(Json(ApiResponse::ok(PluginListResponse::new(
        &catalog,
        store.is_backend_ready(),
    ))))
}
