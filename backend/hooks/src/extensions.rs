//! Extension engine: named lifecycle points for request-processing pipelines.
//!
//! A point is enabled only at construction, from an explicit list of names.
//! Handlers registered against any other name are ignored, and executing an
//! unknown or disabled point fails with `OrbitError::NotSupported`.

use std::collections::HashMap;
use std::sync::Arc;

use orbit_core::OrbitError;
use serde_json::Value;
use tracing::{debug, warn};

use crate::types::{ExtensionHandler, ExtensionRegistration};

#[derive(Default, Clone)]
pub struct ExtensionEngine {
    /// Enabled points and their handlers in registration order.
    points: HashMap<String, Vec<Arc<dyn ExtensionHandler>>>,
}

impl ExtensionEngine {
    /// Create an engine with the given points enabled and no handlers.
    pub fn new<I, S>(enabled: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let points = enabled.into_iter().map(|p| (p.into(), Vec::new())).collect();
        Self { points }
    }

    /// Create an engine from an extensions configuration: the enabled list
    /// plus groups of registrations, applied group by group.
    pub fn from_parts<I, S>(enabled: I, register: Vec<Vec<ExtensionRegistration>>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut engine = Self::new(enabled);
        for group in register {
            engine.register_all(group);
        }
        engine
    }

    pub fn is_enabled(&self, point: &str) -> bool {
        self.points.contains_key(point)
    }

    pub fn handler_count(&self, point: &str) -> usize {
        self.points.get(point).map_or(0, Vec::len)
    }

    /// Register a handler. Returns `false` (and does nothing) when `point` is
    /// not enabled.
    pub fn register(&mut self, point: &str, handler: Arc<dyn ExtensionHandler>) -> bool {
        match self.points.get_mut(point) {
            Some(handlers) => {
                handlers.push(handler);
                debug!(point, handlers = handlers.len(), "Extension handler registered");
                true
            }
            None => {
                warn!(point, "Ignoring handler for extension point that is not enabled");
                false
            }
        }
    }

    /// Register a batch; returns how many registrations took effect.
    pub fn register_all(&mut self, registrations: impl IntoIterator<Item = ExtensionRegistration>) -> usize {
        registrations
            .into_iter()
            .filter(|r| self.register(&r.point, Arc::clone(&r.handler)))
            .count()
    }

    /// Run the handlers of `point` in registration order, each with `args`.
    ///
    /// Resolves to their results in the same order. The first handler error
    /// stops the chain.
    pub async fn exec(&self, point: &str, args: Vec<Value>) -> Result<Vec<Value>, OrbitError> {
        let Some(handlers) = self.points.get(point) else {
            return Err(OrbitError::NotSupported(point.to_string()));
        };

        let mut results = Vec::with_capacity(handlers.len());
        for (index, handler) in handlers.iter().enumerate() {
            debug!(point, index, "Running extension handler");
            let value = handler.handle(args.clone()).await.map_err(|source| OrbitError::Extension {
                point: point.to_string(),
                source,
            })?;
            results.push(value);
        }
        Ok(results)
    }
}

impl std::fmt::Debug for ExtensionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let counts: HashMap<&str, usize> =
            self.points.iter().map(|(k, v)| (k.as_str(), v.len())).collect();
        f.debug_struct("ExtensionEngine").field("points", &counts).finish()
    }
}
