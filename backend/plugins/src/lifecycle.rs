//! Lifecycle orchestration: one-time attach pass, then phase-ordered
//! `connect()` and reverse-ordered `close()`.
//!
//! Connectors and destructors are kept per phase. Destructors are stored
//! last-registered-first, so walking the phases backwards undoes startup in
//! exact LIFO order. Both collections are only written while attaching.

use std::collections::BTreeMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;

use orbit_config::ServiceConfig;
use orbit_core::{
    Connector, Destructor, HealthCheck, HealthProbe, LifecycleEvent, LifecycleEventKind, LifecyclePhase,
    OrbitError, panic_message,
};
use orbit_hooks::{
    ErrorChannel, ErrorReporter, ExtensionEngine, ExtensionHandler, ExtensionRegistration, HookBus, HookListener,
};
use serde_json::Value;
use tracing::{debug, error, info};

use crate::descriptor::PluginDescriptor;
use crate::event_bus::EventBus;

/// A connector and the plugin that registered it.
#[derive(Clone)]
pub struct ConnectorEntry {
    pub plugin: String,
    pub handler: Arc<dyn Connector>,
}

/// A destructor and the plugin that registered it.
#[derive(Clone)]
pub struct DestructorEntry {
    pub plugin: String,
    pub handler: Arc<dyn Destructor>,
}

// ---------------------------------------------------------------------------
// Attach context
// ---------------------------------------------------------------------------

/// Host handle passed to a plugin's attach function.
///
/// Everything a plugin registers here is staged and only becomes part of the
/// service once its attach function returned successfully.
pub struct AttachContext<'a> {
    plugin: String,
    phase: LifecyclePhase,
    config: &'a ServiceConfig,
    attached: &'a [String],
    extensions: &'a ExtensionEngine,
    reporter: ErrorReporter,
    staged: Contributions,
    connectors: Vec<(LifecyclePhase, Arc<dyn Connector>)>,
    destructors: Vec<(LifecyclePhase, Arc<dyn Destructor>)>,
    health_checks: Vec<HealthCheck>,
}

/// Registrations that belong to service-level components rather than to the
/// orchestrator.
#[derive(Default)]
pub struct Contributions {
    pub hooks: HookBus,
    pub errors: ErrorChannel,
    pub extensions: Vec<ExtensionRegistration>,
}

impl<'a> AttachContext<'a> {
    fn new(
        descriptor: &PluginDescriptor,
        config: &'a ServiceConfig,
        attached: &'a [String],
        extensions: &'a ExtensionEngine,
        reporter: ErrorReporter,
    ) -> Self {
        Self {
            plugin: descriptor.name().to_string(),
            phase: descriptor.phase(),
            config,
            attached,
            extensions,
            reporter,
            staged: Contributions::default(),
            connectors: Vec::new(),
            destructors: Vec::new(),
            health_checks: Vec::new(),
        }
    }

    pub fn plugin_name(&self) -> &str {
        &self.plugin
    }

    pub fn phase(&self) -> LifecyclePhase {
        self.phase
    }

    pub fn service_config(&self) -> &ServiceConfig {
        self.config
    }

    /// Plugins attached before this one, in attach order.
    pub fn attached_plugins(&self) -> &[String] {
        self.attached
    }

    pub fn add_connector(&mut self, phase: LifecyclePhase, connector: impl Connector + 'static) {
        self.connectors.push((phase, Arc::new(connector)));
    }

    pub fn add_destructor(&mut self, phase: LifecyclePhase, destructor: impl Destructor + 'static) {
        self.destructors.push((phase, Arc::new(destructor)));
    }

    pub fn add_health_check(&mut self, name: impl Into<String>, probe: impl HealthProbe + 'static) {
        self.health_checks.push(HealthCheck::new(name, Arc::new(probe)));
    }

    pub fn on_hook(&mut self, event: impl Into<String>, listener: impl HookListener + 'static) {
        self.staged.hooks.on(event, listener);
    }

    pub fn on_error(&mut self, listener: impl Fn(&anyhow::Error) + Send + Sync + 'static) {
        self.staged.errors.on_error(listener);
    }

    /// Handle for reporting errors after attach, e.g. from a connection task.
    /// Errors nobody listens for escalate as `OrbitError::Unhandled`.
    pub fn error_reporter(&self) -> ErrorReporter {
        self.reporter.clone()
    }

    /// Stage an extension handler. Returns `false` when the point is not
    /// enabled; such a handler is dropped.
    pub fn register_extension(&mut self, point: &str, handler: impl ExtensionHandler + 'static) -> bool {
        if !self.extensions.is_enabled(point) {
            debug!(plugin = %self.plugin, point, "Extension point not enabled; handler ignored");
            return false;
        }
        self.staged.extensions.push(ExtensionRegistration::new(point, handler));
        true
    }
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

pub struct LifecycleOrchestrator {
    service: String,
    attached: Vec<String>,
    connectors: BTreeMap<LifecyclePhase, Vec<ConnectorEntry>>,
    destructors: BTreeMap<LifecyclePhase, Vec<DestructorEntry>>,
    health_checks: Vec<HealthCheck>,
    events: EventBus,
    reporter: ErrorReporter,
}

impl LifecycleOrchestrator {
    pub fn new(service: impl Into<String>, events: EventBus) -> Self {
        Self {
            service: service.into(),
            attached: Vec::new(),
            connectors: BTreeMap::new(),
            destructors: BTreeMap::new(),
            health_checks: Vec::new(),
            events,
            reporter: ErrorReporter::new(),
        }
    }

    /// Attach one plugin.
    ///
    /// Calls the descriptor's attach function with the plugin's configuration
    /// slice. On success the plugin's handlers are committed and the
    /// service-level registrations are handed back; on failure nothing of
    /// this plugin is kept.
    pub fn attach(
        &mut self,
        descriptor: &PluginDescriptor,
        config: &ServiceConfig,
        extensions: &ExtensionEngine,
    ) -> Result<Contributions, OrbitError> {
        let name = descriptor.name();
        if self.attached.iter().any(|p| p == name) {
            return Err(OrbitError::DuplicatePlugin(name.to_string()));
        }

        debug!(plugin = name, phase = %descriptor.phase(), "Attaching plugin");
        let plugin_config = config.plugin_config(name);
        let mut ctx = AttachContext::new(descriptor, config, &self.attached, extensions, self.reporter.clone());
        let outcome = std::panic::catch_unwind(AssertUnwindSafe(|| descriptor.attach(&plugin_config, &mut ctx)))
            .unwrap_or_else(|panic| Err(anyhow::anyhow!("attach panicked: {}", panic_message(panic.as_ref()))));
        let interface = match outcome {
            Ok(interface) => interface.unwrap_or_default(),
            Err(source) => {
                error!(plugin = name, error = %source, "Plugin attach failed");
                return Err(OrbitError::Attach { plugin: name.to_string(), source });
            }
        };
        let AttachContext { staged, connectors, destructors, health_checks, .. } = ctx;

        for (phase, handler) in connectors {
            self.push_connector(phase, name, handler);
        }
        for (phase, handler) in destructors {
            self.push_destructor(phase, name, handler);
        }
        self.health_checks.extend(health_checks);

        let phase = descriptor.phase();
        if let Some(connect) = interface.connect {
            self.push_connector(phase, name, connect);
        }
        if let Some(close) = interface.close {
            self.push_destructor(phase, name, close);
        }
        if let Some(status) = interface.status {
            self.health_checks.push(HealthCheck::new(name, status));
        }

        self.attached.push(name.to_string());
        info!(plugin = name, phase = %phase, "Plugin attached");
        Ok(staged)
    }

    fn push_connector(&mut self, phase: LifecyclePhase, plugin: &str, handler: Arc<dyn Connector>) {
        self.connectors
            .entry(phase)
            .or_default()
            .push(ConnectorEntry { plugin: plugin.to_string(), handler });
    }

    fn push_destructor(&mut self, phase: LifecyclePhase, plugin: &str, handler: Arc<dyn Destructor>) {
        self.destructors
            .entry(phase)
            .or_default()
            .insert(0, DestructorEntry { plugin: plugin.to_string(), handler });
    }

    /// Names of attached plugins, in attach order.
    pub fn attached(&self) -> &[String] {
        &self.attached
    }

    pub fn connectors(&self, phase: LifecyclePhase) -> &[ConnectorEntry] {
        self.connectors.get(&phase).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Destructors of `phase` in the order `close()` runs them.
    pub fn destructors(&self, phase: LifecyclePhase) -> &[DestructorEntry] {
        self.destructors.get(&phase).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn health_checks(&self) -> &[HealthCheck] {
        &self.health_checks
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Reporter shared with every attached plugin.
    pub fn error_reporter(&self) -> &ErrorReporter {
        &self.reporter
    }

    /// Run every connector, phase by phase, one at a time.
    ///
    /// Returns the connector results in invocation order and publishes
    /// `Ready` once all of them completed. The first failure aborts.
    pub async fn connect(&self) -> Result<Vec<Value>, OrbitError> {
        let mut results = Vec::new();
        for phase in LifecyclePhase::ORDER {
            for entry in self.connectors(phase) {
                info!(plugin = %entry.plugin, %phase, "Connecting");
                let value = guarded("connector", entry.handler.connect()).await.map_err(|source| {
                    error!(plugin = %entry.plugin, %phase, error = %source, "Connector failed");
                    OrbitError::Connect { plugin: entry.plugin.clone(), source }
                })?;
                info!(plugin = %entry.plugin, %phase, "Connected");
                self.publish(LifecycleEventKind::PluginConnected, Some(&entry.plugin));
                results.push(value);
            }
        }
        self.publish(LifecycleEventKind::Ready, None);
        Ok(results)
    }

    /// Run every destructor, phases in reverse, one at a time.
    pub async fn close(&self) -> Result<(), OrbitError> {
        for phase in LifecyclePhase::reversed() {
            for entry in self.destructors(phase) {
                info!(plugin = %entry.plugin, %phase, "Closing");
                guarded("destructor", entry.handler.close()).await.map_err(|source| {
                    error!(plugin = %entry.plugin, %phase, error = %source, "Destructor failed");
                    OrbitError::Close { plugin: entry.plugin.clone(), source }
                })?;
                info!(plugin = %entry.plugin, %phase, "Closed");
                self.publish(LifecycleEventKind::PluginClosed, Some(&entry.plugin));
            }
        }
        self.publish(LifecycleEventKind::Close, None);
        Ok(())
    }

    fn publish(&self, kind: LifecycleEventKind, plugin: Option<&str>) {
        self.events.publish(LifecycleEvent::new(&self.service, kind, plugin.map(String::from)));
    }
}

/// Await a plugin handler, turning a panic into an ordinary failure.
async fn guarded<T>(what: &str, call: impl Future<Output = anyhow::Result<T>>) -> anyhow::Result<T> {
    AssertUnwindSafe(call)
        .catch_unwind()
        .await
        .unwrap_or_else(|panic| Err(anyhow::anyhow!("{what} panicked: {}", panic_message(panic.as_ref()))))
}
