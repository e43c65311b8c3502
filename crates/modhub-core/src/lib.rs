//! # modhub-core
//!
//! Core crate for ModHub. Contains configuration schemas, typed
//! identifiers, plugin domain events, and the unified error system.
//!
//! This crate has **no** internal dependencies on other ModHub crates.

pub mod config;
pub mod error;
pub mod events;
pub mod result;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
