use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A lifecycle notification published by a service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LifecycleEvent {
    pub id: Uuid,
    /// Name of the emitting service.
    pub service: String,
    pub timestamp: DateTime<Utc>,
    pub kind: LifecycleEventKind,
    /// Owning plugin for per-plugin events.
    pub plugin: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleEventKind {
    /// A single connector finished.
    PluginConnected,
    /// A single destructor finished.
    PluginClosed,
    /// Every connector finished.
    Ready,
    /// Every destructor finished.
    Close,
}

impl LifecycleEvent {
    pub fn new(service: impl Into<String>, kind: LifecycleEventKind, plugin: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            service: service.into(),
            timestamp: Utc::now(),
            kind,
            plugin,
        }
    }
}

impl std::fmt::Display for LifecycleEventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::PluginConnected => "plugin_connected",
            Self::PluginClosed => "plugin_closed",
            Self::Ready => "ready",
            Self::Close => "close",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_creation() {
        let event = LifecycleEvent::new("svc", LifecycleEventKind::PluginConnected, Some("amqp".into()));
        assert_eq!(event.service, "svc");
        assert_eq!(event.plugin.as_deref(), Some("amqp"));
        assert_eq!(event.kind, LifecycleEventKind::PluginConnected);
    }

    #[test]
    fn test_event_kind_display_matches_serde() {
        for kind in [
            LifecycleEventKind::PluginConnected,
            LifecycleEventKind::PluginClosed,
            LifecycleEventKind::Ready,
            LifecycleEventKind::Close,
        ] {
            let json = serde_json::to_value(kind).unwrap();
            assert_eq!(json.as_str().unwrap(), kind.to_string());
        }
    }
}
