//! Plugin descriptors: the static contract every plugin is resolved to.

use std::fmt;
use std::sync::Arc;

use anyhow::Result;
use orbit_core::{LifecyclePhase, OrbitError, PluginInterface};
use serde_json::Value;

use crate::lifecycle::AttachContext;

/// Attach function of a plugin. Receives the plugin's configuration slice and
/// the host context; may expose connect/close/status handlers.
pub type AttachFn =
    Arc<dyn Fn(&Value, &mut AttachContext<'_>) -> Result<Option<PluginInterface>> + Send + Sync>;

/// Immutable description of a plugin: name, lifecycle phase, priority within
/// the phase, and attach function.
#[derive(Clone)]
pub struct PluginDescriptor {
    name: String,
    phase: LifecyclePhase,
    priority: i32,
    attach: AttachFn,
}

impl PluginDescriptor {
    pub fn new<F>(name: impl Into<String>, phase: LifecyclePhase, attach: F) -> Self
    where
        F: Fn(&Value, &mut AttachContext<'_>) -> Result<Option<PluginInterface>> + Send + Sync + 'static,
    {
        Self { name: name.into(), phase, priority: 0, attach: Arc::new(attach) }
    }

    /// Build a descriptor whose phase is given by name, validating it against
    /// the known phases.
    pub fn with_phase_name<F>(name: impl Into<String>, phase: &str, attach: F) -> Result<Self, OrbitError>
    where
        F: Fn(&Value, &mut AttachContext<'_>) -> Result<Option<PluginInterface>> + Send + Sync + 'static,
    {
        let phase: LifecyclePhase = phase.parse()?;
        Ok(Self::new(name, phase, attach))
    }

    /// Lower priorities attach (and connect) first within a phase.
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn phase(&self) -> LifecyclePhase {
        self.phase
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub(crate) fn attach(&self, config: &Value, ctx: &mut AttachContext<'_>) -> Result<Option<PluginInterface>> {
        (self.attach)(config, ctx)
    }
}

impl fmt::Debug for PluginDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginDescriptor")
            .field("name", &self.name)
            .field("phase", &self.phase)
            .field("priority", &self.priority)
            .finish()
    }
}
