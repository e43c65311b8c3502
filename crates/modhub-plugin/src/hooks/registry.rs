//! Listener registry. Listeners subscribe to plugin lifecycle events with priority ordering.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::info;

use modhub_core::events::DomainEvent;
use modhub_core::result::AppResult;

/// Default listener priority.
pub const DEFAULT_PRIORITY: i32 = 100;

/// Receives plugin lifecycle events.
#[async_trait]
pub trait PluginEventListener: Send + Sync + std::fmt::Debug {
    /// Handles one event. Errors are logged by the dispatcher and never
    /// reach the operation that emitted the event.
    async fn handle(&self, event: &DomainEvent) -> AppResult<()>;

    /// Identifier used for logging and unregistration.
    fn listener_id(&self) -> &str;

    /// Lower runs first.
    fn priority(&self) -> i32 {
        DEFAULT_PRIORITY
    }

    /// Whether this listener wants the event at all.
    fn accepts(&self, _event: &DomainEvent) -> bool {
        true
    }
}

#[derive(Debug)]
struct ListenerEntry {
    listener: Arc<dyn PluginEventListener>,
    priority: i32,
    listener_id: String,
}

/// Registered listeners, kept sorted by priority.
#[derive(Debug)]
pub struct ListenerRegistry {
    listeners: RwLock<Vec<ListenerEntry>>,
}

impl ListenerRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            listeners: RwLock::new(Vec::new()),
        }
    }

    /// Registers a listener.
    pub async fn register(&self, listener: Arc<dyn PluginEventListener>) {
        let listener_id = listener.listener_id().to_string();
        let priority = listener.priority();

        let mut listeners = self.listeners.write().await;
        listeners.push(ListenerEntry {
            listener,
            priority,
            listener_id: listener_id.clone(),
        });
        // Stable sort keeps registration order among equal priorities.
        listeners.sort_by_key(|e| e.priority);

        info!(listener_id = %listener_id, priority, "Plugin event listener registered");
    }

    /// Removes every listener with this id. Returns how many were removed.
    pub async fn unregister(&self, listener_id: &str) -> usize {
        let mut listeners = self.listeners.write().await;
        let before = listeners.len();
        listeners.retain(|e| e.listener_id != listener_id);
        let removed = before - listeners.len();

        if removed > 0 {
            info!(listener_id = %listener_id, "Plugin event listener unregistered");
        }
        removed
    }

    /// Listeners that accept this event, in priority order.
    pub async fn listeners_for(&self, event: &DomainEvent) -> Vec<Arc<dyn PluginEventListener>> {
        let listeners = self.listeners.read().await;
        listeners
            .iter()
            .filter(|e| e.listener.accepts(event))
            .map(|e| Arc::clone(&e.listener))
            .collect()
    }

    /// Number of registered listeners.
    pub async fn count(&self) -> usize {
        self.listeners.read().await.len()
    }
}

impl Default for ListenerRegistry {
    fn default() -> Self {
        Self::new()
    }
}
