//! Lifecycle Event Logger
//!
//! Writes lifecycle events to a dedicated tracing target so they can be
//! filtered (`RUST_LOG=lifecycle_events=info`) or routed to the NDJSON file.

use orbit_core::{LifecycleEvent, LifecycleEventKind};
use tracing::{debug, info};

pub const LIFECYCLE_TARGET: &str = "lifecycle_events";

/// Log a lifecycle event. Service-wide transitions are logged at info level,
/// per-plugin ones at debug.
pub fn log_lifecycle_event(event: &LifecycleEvent) {
    let payload = serde_json::to_string(event).unwrap_or_else(|_| format!("{event:?}"));
    match event.kind {
        LifecycleEventKind::Ready | LifecycleEventKind::Close => {
            info!(
                target: LIFECYCLE_TARGET,
                service = %event.service,
                kind = %event.kind,
                event = %payload,
                "Lifecycle event"
            );
        }
        LifecycleEventKind::PluginConnected | LifecycleEventKind::PluginClosed => {
            debug!(
                target: LIFECYCLE_TARGET,
                service = %event.service,
                kind = %event.kind,
                plugin = event.plugin.as_deref().unwrap_or("-"),
                event = %payload,
                "Lifecycle event"
            );
        }
    }
}
