//! Plugin event listeners: registry and dispatcher.

pub mod dispatcher;
pub mod registry;

pub use dispatcher::{DispatchReport, EventDispatcher};
pub use registry::{ListenerRegistry, PluginEventListener};
