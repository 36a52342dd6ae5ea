//! Lifecycle event bus
//!
//! Broadcasts `ready`/`close` and per-plugin connect/close notifications to
//! whoever subscribed. Publishing with no subscribers is not an error.

use orbit_core::LifecycleEvent;
use tokio::sync::broadcast;
use tracing::debug;

const DEFAULT_CAPACITY: usize = 100;

#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<LifecycleEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { sender: tx }
    }

    pub fn publish(&self, event: LifecycleEvent) {
        debug!(kind = %event.kind, plugin = ?event.plugin, "Publishing lifecycle event");
        let _ = self.sender.send(event);
    }

    /// Receiver for events published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<LifecycleEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
