//! # modhub-plugin
//!
//! Plugin registry for ModHub. Provides:
//!
//! - Directory scanning of `module.json` manifests
//! - Reconciliation of discovered plugins with persisted flags
//! - Enable/disable with autoload manifest (`composer.json`) rewriting
//! - Plugin event listeners and a fire-and-forget dispatcher
//! - Install/uninstall command invocation

pub mod autoload;
pub mod catalog;
pub mod command;
pub mod descriptor;
pub mod hooks;
pub mod installer;
pub mod scanner;
pub mod store;

pub use autoload::{AutoloadChange, AutoloadManifest};
pub use catalog::Catalog;
pub use command::{CommandOutput, CommandRunner, ProcessCommandRunner};
pub use descriptor::{ModuleManifest, PluginDescriptor};
pub use hooks::{EventDispatcher, ListenerRegistry, PluginEventListener};
pub use installer::{InstallOutcome, PluginInstaller};
pub use scanner::{PluginScanner, ScanConflict, ScanReport};
pub use store::{PluginRef, PluginStore};
