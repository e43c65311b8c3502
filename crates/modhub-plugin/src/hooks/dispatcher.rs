//! Event dispatcher. Delivers plugin events to listeners in priority order.
//!
//! Every listener runs regardless of the others' results. A failing or
//! slow listener is logged and skipped; emitters never observe listener
//! failures.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, warn};

use modhub_core::events::DomainEvent;

use super::registry::ListenerRegistry;

/// Per-listener time limit.
pub const DEFAULT_LISTENER_TIMEOUT: Duration = Duration::from_secs(30);

/// Outcome of delivering one event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Listeners that handled the event.
    pub delivered: Vec<String>,
    /// Listeners that failed or timed out.
    pub failed: Vec<String>,
}

/// Delivers events to the listeners of a [`ListenerRegistry`].
#[derive(Debug)]
pub struct EventDispatcher {
    registry: Arc<ListenerRegistry>,
    timeout: Duration,
}

impl EventDispatcher {
    /// Creates a dispatcher with the default listener timeout.
    pub fn new(registry: Arc<ListenerRegistry>) -> Self {
        Self::with_timeout(registry, DEFAULT_LISTENER_TIMEOUT)
    }

    /// Creates a dispatcher with a custom listener timeout.
    pub fn with_timeout(registry: Arc<ListenerRegistry>, timeout: Duration) -> Self {
        Self { registry, timeout }
    }

    /// Delivers an event to every accepting listener.
    pub async fn dispatch(&self, event: &DomainEvent) -> DispatchReport {
        let listeners = self.registry.listeners_for(event).await;
        let mut report = DispatchReport::default();

        if listeners.is_empty() {
            return report;
        }

        debug!(
            event = event.name(),
            listener_count = listeners.len(),
            "Dispatching plugin event"
        );

        for listener in &listeners {
            let id = listener.listener_id().to_string();
            match tokio::time::timeout(self.timeout, listener.handle(event)).await {
                Ok(Ok(())) => report.delivered.push(id),
                Ok(Err(e)) => {
                    warn!(event = event.name(), listener_id = %id, error = %e, "Listener failed");
                    report.failed.push(id);
                }
                Err(_) => {
                    error!(
                        event = event.name(),
                        listener_id = %id,
                        timeout_ms = self.timeout.as_millis() as u64,
                        "Listener timed out"
                    );
                    report.failed.push(id);
                }
            }
        }

        report
    }

    /// Delivers an event, discarding the report.
    pub async fn fire_and_forget(&self, event: &DomainEvent) {
        let _ = self.dispatch(event).await;
    }

    /// The listener registry.
    pub fn registry(&self) -> &Arc<ListenerRegistry> {
        &self.registry
    }
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self::new(Arc::new(ListenerRegistry::new()))
    }
}
