//! Shutdown Supervisor
//!
//! Races a service's `close()` against a deadline. If close does not finish
//! in time the caller is told to exit with the reserved status; whatever was
//! not closed yet is left as it is.

use std::future::Future;
use std::time::Duration;

use orbit_config::ShutdownConfig;
use orbit_core::OrbitError;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

#[derive(Debug)]
pub enum ShutdownOutcome {
    Completed,
    Failed(OrbitError),
    TimedOut(Duration),
}

impl ShutdownOutcome {
    pub fn is_clean(&self) -> bool {
        matches!(self, ShutdownOutcome::Completed)
    }

    pub fn into_result(self) -> Result<(), OrbitError> {
        match self {
            ShutdownOutcome::Completed => Ok(()),
            ShutdownOutcome::Failed(err) => Err(err),
            ShutdownOutcome::TimedOut(deadline) => Err(OrbitError::ShutdownTimeout(deadline)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ShutdownSupervisor {
    token: CancellationToken,
    deadline: Duration,
    exit_code: i32,
}

impl ShutdownSupervisor {
    pub fn new(deadline: Duration, exit_code: i32) -> Self {
        Self { token: CancellationToken::new(), deadline, exit_code }
    }

    pub fn from_config(config: &ShutdownConfig) -> Self {
        Self::new(config.timeout(), config.exit_code)
    }

    /// Token cancelled when shutdown is requested. Signal listeners and
    /// long-running tasks share it.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn trigger(&self) {
        self.token.cancel();
    }

    pub fn is_triggered(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    /// Resolves once shutdown was requested.
    pub async fn wait(&self) {
        self.token.cancelled().await
    }

    /// Run `close` under the deadline. Marks shutdown as requested first.
    pub async fn run<F>(&self, close: F) -> ShutdownOutcome
    where
        F: Future<Output = Result<(), OrbitError>>,
    {
        self.trigger();
        info!(deadline = ?self.deadline, "Closing service");
        match tokio::time::timeout(self.deadline, close).await {
            Ok(Ok(())) => {
                info!("Service closed");
                ShutdownOutcome::Completed
            }
            Ok(Err(e)) => {
                error!(error = %e, "Service close failed");
                ShutdownOutcome::Failed(e)
            }
            Err(_) => {
                warn!(deadline = ?self.deadline, "Service close exceeded deadline; forcing exit");
                ShutdownOutcome::TimedOut(self.deadline)
            }
        }
    }

    /// Process exit status for an outcome: 0 when clean, the reserved status
    /// otherwise.
    pub fn exit_code(&self, outcome: &ShutdownOutcome) -> i32 {
        if outcome.is_clean() { 0 } else { self.exit_code }
    }
}
