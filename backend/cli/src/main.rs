mod builtin;
mod config;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tokio::sync::broadcast::error::RecvError;
use tracing::{error, info, warn};

use orbit_config::ServiceConfig;
use orbit_core::OrbitError;
use orbit_logging::log_lifecycle_event;
use orbit_plugins::Service;
use orbit_supervisor::{spawn_signal_listener, ShutdownSupervisor};

#[derive(Parser)]
#[command(name = "orbit")]
#[command(about = "Run an orbit service from its configuration")]
#[command(version)]
struct Cli {
    /// Path to the service configuration (defaults to ~/.orbit/service.yaml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Connect the service and keep it running until Ctrl-C or SIGTERM
    Run,
    /// Connect, print the health summary as JSON and close again
    Health,
    /// Print the resolved attach order
    Plugins,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let path = config::resolve_path(cli.config);
    config::init_logging(&path).await;

    let config = match config::load(&path).await {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Fatal: invalid configuration");
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Run => run(config).await,
        Commands::Health => health(config).await,
        Commands::Plugins => plugins(&config).map(|()| 0),
    };

    match result {
        Ok(0) => Ok(()),
        Ok(code) => std::process::exit(code),
        Err(e) => {
            match e.downcast_ref::<OrbitError>() {
                Some(OrbitError::Unhandled(cause)) => error!(error = %cause, "Fatal: unhandled service error"),
                _ => error!(error = %e, "Fatal"),
            }
            std::process::exit(1);
        }
    }
}

/// Standalone run: connect, wait for a shutdown signal or an unhandled
/// service error, close under the supervisor's deadline. Returns the process
/// exit status; an unhandled error is returned as fatal after closing.
async fn run(config: ServiceConfig) -> Result<i32> {
    let supervisor = ShutdownSupervisor::from_config(&config.shutdown);
    let service = build(config)?;
    spawn_event_logger(&service);

    let connected = service.connect().await?;
    info!(service = %service.name(), connectors = connected.len(), "Service ready");

    let signals = spawn_signal_listener(supervisor.token());
    let unhandled = tokio::select! {
        _ = supervisor.wait() => None,
        message = service.unhandled() => Some(message),
    };
    signals.abort();

    let outcome = supervisor.run(service.close()).await;
    if let Some(message) = unhandled {
        return Err(OrbitError::Unhandled(anyhow::anyhow!(message)).into());
    }
    Ok(supervisor.exit_code(&outcome))
}

async fn health(config: ServiceConfig) -> Result<i32> {
    let service = build(config)?;
    service.connect().await?;

    let summary = service.health_status().await;
    println!("{}", serde_json::to_string_pretty(&summary)?);

    service.close().await?;
    Ok(if summary.is_ok() { 0 } else { 1 })
}

fn plugins(config: &ServiceConfig) -> Result<()> {
    let registry = builtin::discovery_table()?;
    let resolved = registry.resolve(config.plugins.as_slice())?;
    println!("{:<24} {:<12} {:>8}", "PLUGIN", "PHASE", "PRIORITY");
    for descriptor in &resolved {
        println!("{:<24} {:<12} {:>8}", descriptor.name(), descriptor.phase().as_str(), descriptor.priority());
    }
    Ok(())
}

fn build(config: ServiceConfig) -> Result<Service> {
    let registry = builtin::discovery_table()?;
    Ok(Service::new(config, registry)?)
}

/// Forward lifecycle events to the dedicated log target.
fn spawn_event_logger(service: &Service) {
    let mut events = service.subscribe();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => log_lifecycle_event(&event),
                Err(RecvError::Lagged(missed)) => warn!(missed, "Lifecycle event logger lagged"),
                Err(RecvError::Closed) => break,
            }
        }
    });
}
