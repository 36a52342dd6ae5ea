use std::future::Future;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

/// Startup handler contributed by a plugin for its lifecycle phase.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Bring the underlying resource up. The returned value is collected into
    /// the result list of `connect()`.
    async fn connect(&self) -> Result<Value>;
}

/// Teardown handler, run in reverse of connector order.
#[async_trait]
pub trait Destructor: Send + Sync {
    async fn close(&self) -> Result<()>;
}

/// Liveness check for a plugin's underlying resource.
#[async_trait]
pub trait HealthProbe: Send + Sync {
    /// Resolve when the resource is alive; any error marks the attempt failed.
    async fn check(&self) -> Result<Value>;
}

#[async_trait]
impl<F, Fut> Connector for F
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value>> + Send + 'static,
{
    async fn connect(&self) -> Result<Value> {
        (self)().await
    }
}

#[async_trait]
impl<F, Fut> Destructor for F
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    async fn close(&self) -> Result<()> {
        (self)().await
    }
}

#[async_trait]
impl<F, Fut> HealthProbe for F
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value>> + Send + 'static,
{
    async fn check(&self) -> Result<Value> {
        (self)().await
    }
}

/// Handlers a plugin exposes from `attach`. Every handler is optional.
#[derive(Clone, Default)]
pub struct PluginInterface {
    pub connect: Option<Arc<dyn Connector>>,
    pub close: Option<Arc<dyn Destructor>>,
    pub status: Option<Arc<dyn HealthProbe>>,
}

impl PluginInterface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_connect(mut self, connector: impl Connector + 'static) -> Self {
        self.connect = Some(Arc::new(connector));
        self
    }

    pub fn with_close(mut self, destructor: impl Destructor + 'static) -> Self {
        self.close = Some(Arc::new(destructor));
        self
    }

    pub fn with_status(mut self, probe: impl HealthProbe + 'static) -> Self {
        self.status = Some(Arc::new(probe));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.connect.is_none() && self.close.is_none() && self.status.is_none()
    }
}

impl std::fmt::Debug for PluginInterface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginInterface")
            .field("connect", &self.connect.is_some())
            .field("close", &self.close.is_some())
            .field("status", &self.status.is_some())
            .finish()
    }
}

/// A named health probe, as stored by the service.
#[derive(Clone)]
pub struct HealthCheck {
    pub name: String,
    pub probe: Arc<dyn HealthProbe>,
}

impl HealthCheck {
    pub fn new(name: impl Into<String>, probe: Arc<dyn HealthProbe>) -> Self {
        Self { name: name.into(), probe }
    }
}

impl std::fmt::Debug for HealthCheck {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HealthCheck").field("name", &self.name).finish()
    }
}
