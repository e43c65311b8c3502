//! Autoload manifest (`composer.json`) maintenance.

pub mod lock;
pub mod manifest;

pub use lock::{ManifestLock, write_atomic};
pub use manifest::{AutoloadChange, AutoloadManifest, apply_entry};
