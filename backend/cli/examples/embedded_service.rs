//! Embedding an orbit service in a host binary: register plugins in a
//! discovery table, wire a hook and an extension point, connect and close.
//!
//! Run with `cargo run -p orbit-cli --example embedded_service`.

use std::time::Duration;

use anyhow::Result;
use orbit_config::{LoggingConfig, ServiceConfig};
use orbit_core::{extension_points, LifecyclePhase, PluginInterface};
use orbit_plugins::{PluginDescriptor, PluginRegistry, Service};
use orbit_supervisor::ShutdownSupervisor;
use serde_json::{json, Value};

fn database() -> PluginDescriptor {
    PluginDescriptor::new("database", LifecyclePhase::Database, |conf, ctx| {
        let url = conf.get("url").and_then(Value::as_str).unwrap_or("memory://").to_string();
        ctx.on_hook("audit", |args: Vec<Value>| async move { anyhow::Ok(json!({ "database": args })) });
        Ok(Some(
            PluginInterface::new()
                .with_connect(move || {
                    let url = url.clone();
                    async move { anyhow::Ok(json!({ "connected": url })) }
                })
                .with_close(|| async { anyhow::Ok(()) })
                .with_status(|| async { anyhow::Ok(json!("ok")) }),
        ))
    })
}

fn router() -> PluginDescriptor {
    PluginDescriptor::new("router", LifecyclePhase::Application, |_, ctx| {
        ctx.register_extension(extension_points::POST_HANDLER, |args: Vec<Value>| async move {
            anyhow::Ok(json!({ "handled": args }))
        });
        Ok(Some(PluginInterface::new().with_connect(|| async { anyhow::Ok(json!("listening")) })))
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    orbit_logging::init_logger(&LoggingConfig::default());

    let mut registry = PluginRegistry::new();
    registry.register(database())?;
    registry.register(router())?;

    let mut config = ServiceConfig::default()
        .with_plugins(["router", "database"])
        .with_plugin_config("database", json!({ "url": "postgres://localhost/orbit" }));
    config.extensions.enabled = vec![extension_points::POST_HANDLER.to_string()];

    let service = Service::new(config, registry)?;
    println!("connect: {:?}", service.connect().await?);
    println!("audit: {:?}", service.hook("audit", vec![json!("login")]).await?);
    println!("postHandler: {:?}", service.exec(extension_points::POST_HANDLER, vec![json!("GET /")]).await?);
    println!("health: {}", serde_json::to_string(&service.health_status().await)?);

    let supervisor = ShutdownSupervisor::new(Duration::from_secs(5), 128);
    let outcome = supervisor.run(service.close()).await;
    std::process::exit(supervisor.exit_code(&outcome));
}
