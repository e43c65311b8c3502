//! Core type definitions used across the ModHub workspace.

pub mod id;

pub use id::PluginId;
