//! HTTP handlers grouped by domain.

pub mod health;
pub mod plugins;
