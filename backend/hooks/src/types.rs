//! Listener and handler traits for hooks and extension points.
//!
//! Both take the invocation arguments by value (every listener of a fan-out
//! gets its own copy) and produce a JSON value. Plain async closures
//! implement both traits.
use std::future::Future;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

// ---------------------------------------------------------------------------
// Hook listeners
// ---------------------------------------------------------------------------

/// A listener attached to a named hook.
#[async_trait]
pub trait HookListener: Send + Sync {
    async fn call(&self, args: Vec<Value>) -> Result<Value>;
}

#[async_trait]
impl<F, Fut> HookListener for F
where
    F: Fn(Vec<Value>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value>> + Send + 'static,
{
    async fn call(&self, args: Vec<Value>) -> Result<Value> {
        (self)(args).await
    }
}

// ---------------------------------------------------------------------------
// Extension handlers
// ---------------------------------------------------------------------------

/// A handler registered against an extension point.
#[async_trait]
pub trait ExtensionHandler: Send + Sync {
    async fn handle(&self, args: Vec<Value>) -> Result<Value>;
}

#[async_trait]
impl<F, Fut> ExtensionHandler for F
where
    F: Fn(Vec<Value>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value>> + Send + 'static,
{
    async fn handle(&self, args: Vec<Value>) -> Result<Value> {
        (self)(args).await
    }
}

/// One `{point, handler}` pair of an extensions configuration.
#[derive(Clone)]
pub struct ExtensionRegistration {
    pub point: String,
    pub handler: Arc<dyn ExtensionHandler>,
}

impl ExtensionRegistration {
    pub fn new(point: impl Into<String>, handler: impl ExtensionHandler + 'static) -> Self {
        Self { point: point.into(), handler: Arc::new(handler) }
    }
}

impl std::fmt::Debug for ExtensionRegistration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtensionRegistration").field("point", &self.point).finish()
    }
}

// ---------------------------------------------------------------------------
// Error listeners
// ---------------------------------------------------------------------------

/// Receives service-level errors reported through the error channel.
pub type ErrorListener = Arc<dyn Fn(&anyhow::Error) + Send + Sync>;
