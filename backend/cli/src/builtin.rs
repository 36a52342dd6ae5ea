//! Discovery table of the plugins that ship with the `orbit` binary.

use std::time::Instant;

use orbit_core::{LifecyclePhase, OrbitError, PluginInterface};
use orbit_plugins::{PluginDescriptor, PluginRegistry};
use serde_json::json;

pub const UPTIME_PLUGIN: &str = "uptime";

/// Plugins attached when the configuration names none.
pub const DEFAULT_PLUGINS: &[&str] = &[UPTIME_PLUGIN];

pub fn discovery_table() -> Result<PluginRegistry, OrbitError> {
    let mut registry = PluginRegistry::new();
    registry.register(uptime())?;
    Ok(registry)
}

/// Reports how long the service has been up. Its status probe never fails.
fn uptime() -> PluginDescriptor {
    PluginDescriptor::new(UPTIME_PLUGIN, LifecyclePhase::Application, |_, ctx| {
        let started = Instant::now();
        let service = ctx.service_config().name.clone();
        Ok(Some(
            PluginInterface::new()
                .with_connect(move || {
                    let service = service.clone();
                    async move { anyhow::Ok(json!({ "service": service })) }
                })
                .with_status(move || async move {
                    anyhow::Ok(json!({ "uptimeSecs": started.elapsed().as_secs() }))
                }),
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use orbit_config::ServiceConfig;
    use orbit_plugins::Service;

    #[tokio::test]
    async fn uptime_plugin_reports_alive() {
        let config = ServiceConfig::default().with_plugins(DEFAULT_PLUGINS.iter().copied());
        let service = Service::new(config, discovery_table().unwrap()).unwrap();

        let connected = service.connect().await.unwrap();
        assert_eq!(connected, vec![json!({ "service": "orbit" })]);
        let summary = service.health_status().await;
        assert!(summary.is_ok());
        assert_eq!(summary.alive, vec![UPTIME_PLUGIN]);
    }
}
