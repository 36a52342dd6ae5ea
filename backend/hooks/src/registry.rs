//! Hook bus: named, multi-listener fan-out.
//!
//! Listeners of one event run concurrently; results are handed back in
//! registration order whatever order they complete in. The call waits for
//! every listener and fails if any of them failed.
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::join_all;
use orbit_core::{OrbitError, panic_message};
use serde_json::Value;
use tracing::{debug, warn};

use crate::types::HookListener;

type ListenerBox = Arc<dyn HookListener>;

#[derive(Default, Clone)]
pub struct HookBus {
    listeners: HashMap<String, Vec<ListenerBox>>,
}

impl HookBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a listener for `event`.
    pub fn on(&mut self, event: impl Into<String>, listener: impl HookListener + 'static) {
        self.on_arc(event, Arc::new(listener));
    }

    pub fn on_arc(&mut self, event: impl Into<String>, listener: Arc<dyn HookListener>) {
        self.listeners.entry(event.into()).or_default().push(listener);
    }

    pub fn listener_count(&self, event: &str) -> usize {
        self.listeners.get(event).map_or(0, Vec::len)
    }

    /// Names of events with at least one listener.
    pub fn events(&self) -> impl Iterator<Item = &str> {
        self.listeners.keys().map(String::as_str)
    }

    /// Invoke every listener of `event` with `args`.
    ///
    /// Resolves to the listener results in registration order; an event with
    /// no listeners resolves to an empty list. A listener error or panic fails
    /// the whole call with the first failure in registration order.
    pub async fn hook(&self, event: &str, args: Vec<Value>) -> Result<Vec<Value>, OrbitError> {
        let Some(chain) = self.listeners.get(event) else {
            debug!(event, "[Hooks] No listeners");
            return Ok(Vec::new());
        };

        debug!(event, listeners = chain.len(), "[Hooks] Fanning out");
        let calls = chain.iter().map(|listener| {
            let listener = Arc::clone(listener);
            let args = args.clone();
            async move { AssertUnwindSafe(listener.call(args)).catch_unwind().await }
        });
        let outcomes = join_all(calls).await;

        let mut results = Vec::with_capacity(outcomes.len());
        for (index, outcome) in outcomes.into_iter().enumerate() {
            let source = match outcome {
                Ok(Ok(value)) => {
                    results.push(value);
                    continue;
                }
                Ok(Err(e)) => e,
                Err(panic) => anyhow::anyhow!("listener panicked: {}", panic_message(panic.as_ref())),
            };
            warn!(event, index, error = %source, "[Hooks] Listener failed");
            return Err(OrbitError::Hook { event: event.to_string(), index, source });
        }
        Ok(results)
    }

    /// Move every listener of `other` behind the listeners already present.
    pub fn merge(&mut self, other: HookBus) {
        for (event, listeners) in other.listeners {
            self.listeners.entry(event).or_default().extend(listeners);
        }
    }
}

impl std::fmt::Debug for HookBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let counts: HashMap<&str, usize> =
            self.listeners.iter().map(|(k, v)| (k.as_str(), v.len())).collect();
        f.debug_struct("HookBus").field("listeners", &counts).finish()
    }
}
