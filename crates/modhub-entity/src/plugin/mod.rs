//! Plugin domain entities.

pub mod autoload;
pub mod model;

pub use autoload::AutoloadType;
pub use model::{CreatePlugin, PluginRecord, UpdatePlugin};
