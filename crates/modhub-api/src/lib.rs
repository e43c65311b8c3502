//! # modhub-api
//!
//! HTTP API layer for ModHub built on Axum.
//!
//! Exposes the plugin registry: listing, enable/disable, install/uninstall,
//! catalog refresh, and a health endpoint.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use error::ApiError;
pub use router::build_router;
pub use state::AppState;
