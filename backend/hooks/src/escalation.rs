//! Error channel with a crash-on-unhandled policy.
//!
//! Errors reported here are delivered to every registered listener. When no
//! listener is registered the error is handed back as `OrbitError::Unhandled`
//! and the caller is expected to treat it as fatal.
use std::sync::{Arc, OnceLock};

use orbit_core::OrbitError;
use tokio::sync::watch;
use tracing::{debug, error, warn};

use crate::types::ErrorListener;

#[derive(Default, Clone)]
pub struct ErrorChannel {
    listeners: Vec<ErrorListener>,
}

impl ErrorChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_error(&mut self, listener: impl Fn(&anyhow::Error) + Send + Sync + 'static) {
        self.listeners.push(Arc::new(listener));
    }

    pub fn has_listeners(&self) -> bool {
        !self.listeners.is_empty()
    }

    /// Deliver `err` to the listeners, or escalate it when there are none.
    pub fn emit(&self, err: anyhow::Error) -> Result<(), OrbitError> {
        if self.listeners.is_empty() {
            error!(error = %err, "Unhandled service error");
            return Err(OrbitError::Unhandled(err));
        }
        debug!(listeners = self.listeners.len(), error = %err, "Dispatching service error");
        for listener in &self.listeners {
            listener(&err);
        }
        Ok(())
    }

    pub fn merge(&mut self, other: ErrorChannel) {
        self.listeners.extend(other.listeners);
    }
}

impl std::fmt::Debug for ErrorChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ErrorChannel").field("listeners", &self.listeners.len()).finish()
    }
}

/// Cloneable handle for reporting errors into a service's error channel.
///
/// Plugins receive one while attaching and may keep it for as long as they
/// like. The channel itself is installed once the service is built; errors
/// reported before that, or with no listener registered, escalate as
/// `OrbitError::Unhandled` and wake every `unhandled()` waiter.
#[derive(Clone)]
pub struct ErrorReporter {
    shared: Arc<ReporterShared>,
}

struct ReporterShared {
    channel: OnceLock<ErrorChannel>,
    unhandled: watch::Sender<Option<String>>,
}

impl Default for ErrorReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ErrorReporter {
    pub fn new() -> Self {
        let (unhandled, _) = watch::channel(None);
        Self { shared: Arc::new(ReporterShared { channel: OnceLock::new(), unhandled }) }
    }

    /// Install the channel errors are delivered to. Only the first call wins.
    pub fn install(&self, channel: ErrorChannel) {
        if self.shared.channel.set(channel).is_err() {
            warn!("Error channel already installed; keeping the first one");
        }
    }

    pub fn report(&self, err: anyhow::Error) -> Result<(), OrbitError> {
        let result = match self.shared.channel.get() {
            Some(channel) => channel.emit(err),
            None => {
                error!(error = %err, "Error reported before the service was built");
                Err(OrbitError::Unhandled(err))
            }
        };
        if let Err(OrbitError::Unhandled(ref cause)) = result {
            self.shared.unhandled.send_replace(Some(format!("{cause:#}")));
        }
        result
    }

    /// Resolves with the message of the first unhandled error, immediately
    /// if one was already reported.
    pub async fn unhandled(&self) -> String {
        let mut rx = self.shared.unhandled.subscribe();
        loop {
            let current = rx.borrow_and_update().clone();
            if let Some(message) = current {
                return message;
            }
            if rx.changed().await.is_err() {
                return std::future::pending::<String>().await;
            }
        }
    }
}

impl std::fmt::Debug for ErrorReporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ErrorReporter").field("installed", &self.shared.channel.get().is_some()).finish()
    }
}
