//! Service aggregate: owns configuration, attached plugins, hook listeners,
//! the extension engine, the error channel and the lifecycle event bus.
//!
//! A service is built once. Building resolves the configured plugins, attaches
//! them in order and freezes every collection; afterwards the service only
//! reads them.

use std::sync::Arc;

use orbit_config::ServiceConfig;
use orbit_core::{LifecycleEvent, OrbitError};
use orbit_health::{HealthAggregator, HealthSummary, RetryPolicy};
use orbit_hooks::{ErrorChannel, ErrorReporter, ExtensionEngine, ExtensionRegistration, HookBus, HookListener};
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::{info, warn};
use uuid::Uuid;

use crate::event_bus::EventBus;
use crate::lifecycle::LifecycleOrchestrator;
use crate::registry::PluginRegistry;

pub struct ServiceBuilder {
    config: ServiceConfig,
    registry: PluginRegistry,
    hooks: HookBus,
    errors: ErrorChannel,
    extension_groups: Vec<Vec<ExtensionRegistration>>,
    events: EventBus,
}

impl ServiceBuilder {
    pub fn new(config: ServiceConfig) -> Self {
        Self {
            config,
            registry: PluginRegistry::new(),
            hooks: HookBus::new(),
            errors: ErrorChannel::new(),
            extension_groups: Vec::new(),
            events: EventBus::new(),
        }
    }

    pub fn registry(mut self, registry: PluginRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn hook(mut self, event: impl Into<String>, listener: impl HookListener + 'static) -> Self {
        self.hooks.on(event, listener);
        self
    }

    /// Register several listeners for one event, keeping their order.
    pub fn hooks(mut self, event: impl Into<String>, listeners: Vec<Arc<dyn HookListener>>) -> Self {
        let event = event.into();
        for listener in listeners {
            self.hooks.on_arc(event.clone(), listener);
        }
        self
    }

    pub fn on_error(mut self, listener: impl Fn(&anyhow::Error) + Send + Sync + 'static) -> Self {
        self.errors.on_error(listener);
        self
    }

    /// Add one group of extension registrations. Groups are applied in the
    /// order they were added, before anything plugins register.
    pub fn extensions(mut self, group: Vec<ExtensionRegistration>) -> Self {
        self.extension_groups.push(group);
        self
    }

    pub fn event_bus(mut self, events: EventBus) -> Self {
        self.events = events;
        self
    }

    /// Resolve, order and attach the configured plugins.
    ///
    /// Any resolution or attach failure aborts construction.
    pub fn build(self) -> Result<Service, OrbitError> {
        let Self { config, registry, mut hooks, mut errors, extension_groups, events } = self;

        let descriptors = registry.resolve(config.plugins.as_slice())?;
        let mut extensions = ExtensionEngine::from_parts(config.extensions.enabled.iter().cloned(), extension_groups);
        let mut orchestrator = LifecycleOrchestrator::new(config.name.clone(), events);

        let mut plugin_extensions = Vec::new();
        for descriptor in &descriptors {
            let staged = orchestrator.attach(descriptor, &config, &extensions)?;
            hooks.merge(staged.hooks);
            errors.merge(staged.errors);
            plugin_extensions.extend(staged.extensions);
        }
        extensions.register_all(plugin_extensions);
        let reporter = orchestrator.error_reporter().clone();
        reporter.install(errors);

        let health = HealthAggregator::new(RetryPolicy::from(&config.health_checks));
        let service = Service { id: Uuid::new_v4(), config, orchestrator, hooks, reporter, extensions, health };
        info!(
            service = %service.config.name,
            id = %service.id,
            plugins = ?service.plugins(),
            "Service initialised"
        );
        Ok(service)
    }
}

pub struct Service {
    id: Uuid,
    config: ServiceConfig,
    orchestrator: LifecycleOrchestrator,
    hooks: HookBus,
    reporter: ErrorReporter,
    extensions: ExtensionEngine,
    health: HealthAggregator,
}

impl Service {
    /// Build a service with no construction-time hooks or extension groups.
    pub fn new(config: ServiceConfig, registry: PluginRegistry) -> Result<Self, OrbitError> {
        ServiceBuilder::new(config).registry(registry).build()
    }

    pub fn builder(config: ServiceConfig) -> ServiceBuilder {
        ServiceBuilder::new(config)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Attached plugin names, in attach order.
    pub fn plugins(&self) -> &[String] {
        self.orchestrator.attached()
    }

    pub fn orchestrator(&self) -> &LifecycleOrchestrator {
        &self.orchestrator
    }

    pub fn hooks(&self) -> &HookBus {
        &self.hooks
    }

    pub fn extensions(&self) -> &ExtensionEngine {
        &self.extensions
    }

    pub async fn connect(&self) -> Result<Vec<Value>, OrbitError> {
        self.orchestrator.connect().await
    }

    pub async fn close(&self) -> Result<(), OrbitError> {
        self.orchestrator.close().await
    }

    pub async fn health_status(&self) -> HealthSummary {
        self.health.evaluate(self.orchestrator.health_checks()).await
    }

    pub async fn hook(&self, event: &str, args: Vec<Value>) -> Result<Vec<Value>, OrbitError> {
        self.hooks.hook(event, args).await
    }

    pub async fn exec(&self, point: &str, args: Vec<Value>) -> Result<Vec<Value>, OrbitError> {
        self.extensions.exec(point, args).await
    }

    /// Hand an error to the registered error listeners. Without listeners
    /// the error comes back as `OrbitError::Unhandled`.
    pub fn report_error(&self, err: anyhow::Error) -> Result<(), OrbitError> {
        let result = self.reporter.report(err);
        if let Err(ref unhandled) = result {
            warn!(service = %self.config.name, error = %unhandled, "Unhandled service error");
        }
        result
    }

    /// The reporter plugins received while attaching.
    pub fn error_reporter(&self) -> &ErrorReporter {
        &self.reporter
    }

    /// Resolves with the first error nobody handled. Hosts treat it as fatal.
    pub async fn unhandled(&self) -> String {
        self.reporter.unhandled().await
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LifecycleEvent> {
        self.orchestrator.events().subscribe()
    }
}

impl std::fmt::Debug for Service {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Service")
            .field("id", &self.id)
            .field("name", &self.config.name)
            .field("plugins", &self.plugins())
            .finish()
    }
}
