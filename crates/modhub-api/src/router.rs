//! Route definitions for the ModHub HTTP API.
//!
//! All routes are mounted under `/api`.

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::middleware::cors::build_cors_layer;
use crate::middleware::logging::request_logging;
use crate::state::AppState;

/// Build the complete Axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .merge(plugin_routes())
        .merge(health_routes());

    let cors = build_cors_layer(&state.config.server.cors);

    Router::new()
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(axum_middleware::from_fn(request_logging))
        .with_state(state)
}

/// Plugin registry endpoints
fn plugin_routes() -> Router<AppState> {
    Router::new()
        .route("/plugins", get(handlers::plugins::list_plugins))
        .route("/plugins/refresh", post(handlers::plugins::refresh_plugins))
        .route("/plugins/{alias}", get(handlers::plugins::get_plugin))
        .route(
            "/plugins/{alias}/status/{status}",
            post(handlers::plugins::change_status),
        )
        .route(
            "/plugins/{alias}/install",
            post(handlers::plugins::install_plugin),
        )
        .route(
            "/plugins/{alias}/uninstall",
            post(handlers::plugins::uninstall_plugin),
        )
}

/// Health endpoint
fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(handlers::health::health))
}
