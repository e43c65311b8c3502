//! Domain events emitted by plugin registry operations.
//!
//! Events are handed to the plugin event dispatcher and consumed by
//! whatever listeners the host registered (audit, cache busting, ...).

pub mod plugin;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use plugin::PluginEvent;

/// Wrapper for all domain events with metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainEvent {
    /// Unique event ID.
    pub id: Uuid,
    /// When the event occurred.
    pub timestamp: DateTime<Utc>,
    /// The event payload.
    pub payload: EventPayload,
}

/// Union of all domain event types.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "domain", content = "event")]
pub enum EventPayload {
    /// A plugin lifecycle event.
    Plugin(PluginEvent),
}

impl DomainEvent {
    /// Create a new domain event.
    pub fn new(payload: EventPayload) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            payload,
        }
    }

    /// Short name used for listener routing and logging.
    pub fn name(&self) -> &'static str {
        match &self.payload {
            EventPayload::Plugin(event) => event.name(),
        }
    }
}

impl From<PluginEvent> for DomainEvent {
    fn from(event: PluginEvent) -> Self {
        Self::new(EventPayload::Plugin(event))
    }
}
