//! Process signal handling. A signal only cancels the shutdown token; the
//! owner of the token decides what closing means.

use std::future::Future;

use anyhow::Result;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Wait for Ctrl-C or, on unix, SIGTERM. Returns the signal name.
pub async fn wait_for_signal() -> Result<&'static str> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        let mut term = signal(SignalKind::terminate())?;
        tokio::select! {
            res = tokio::signal::ctrl_c() => {
                res?;
                Ok("SIGINT")
            }
            _ = term.recv() => Ok("SIGTERM"),
        }
    }
    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
        Ok("ctrl-c")
    }
}

/// Cancel `token` on the first shutdown signal. The task ends on its own if
/// the token is cancelled by someone else first. If the handlers cannot be
/// installed the token is cancelled right away, so nobody waits for a signal
/// that can never arrive.
pub fn spawn_signal_listener(token: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(listen(token, wait_for_signal()))
}

async fn listen<F>(token: CancellationToken, signal: F)
where
    F: Future<Output = Result<&'static str>>,
{
    tokio::select! {
        _ = token.cancelled() => {}
        received = signal => match received {
            Ok(name) => {
                info!(signal = name, "Shutdown signal received");
                token.cancel();
            }
            Err(e) => {
                error!(error = %e, "Could not install signal handlers; shutting down");
                token.cancel();
            }
        },
    }
}
