//! Service configuration schema.
//!
//! Typed for serde YAML/JSON deserialization. Any top-level key that is not
//! one of the kernel sections below is treated as the configuration slice of
//! the plugin with that name.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::PathBuf;
use std::time::Duration;

use crate::defaults;

/// Top-level keys owned by the kernel sections. A plugin with one of these
/// names could never receive a configuration slice.
pub const RESERVED_KEYS: &[&str] = &["name", "plugins", "healthChecks", "extensions", "shutdown", "logging"];

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Root configuration of a service instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceConfig {
    /// Service name, used in logs and lifecycle events.
    #[serde(default = "defaults::service_name")]
    pub name: String,

    /// Plugins to attach, by name. Order is the resolution order.
    #[serde(default)]
    pub plugins: Vec<String>,

    /// Retry/timeout policy for health probes.
    #[serde(default)]
    pub health_checks: HealthCheckConfig,

    /// Extension points enabled for request pipelines.
    #[serde(default)]
    pub extensions: ExtensionsConfig,

    /// Supervised shutdown settings.
    #[serde(default)]
    pub shutdown: ShutdownConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    /// Per-plugin configuration slices, keyed by plugin name.
    #[serde(flatten)]
    pub plugin_settings: Map<String, Value>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: defaults::service_name(),
            plugins: Vec::new(),
            health_checks: HealthCheckConfig::default(),
            extensions: ExtensionsConfig::default(),
            shutdown: ShutdownConfig::default(),
            logging: LoggingConfig::default(),
            plugin_settings: Map::new(),
        }
    }
}

impl ServiceConfig {
    /// Configuration slice handed to a plugin's attach function.
    /// `Value::Null` when the plugin has no section.
    pub fn plugin_config(&self, plugin: &str) -> Value {
        self.plugin_settings.get(plugin).cloned().unwrap_or(Value::Null)
    }

    pub fn with_plugins<I, S>(mut self, plugins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.plugins = plugins.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_plugin_config(mut self, plugin: impl Into<String>, value: Value) -> Self {
        self.plugin_settings.insert(plugin.into(), value);
        self
    }
}

// ---------------------------------------------------------------------------
// Health checks
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthCheckConfig {
    /// Attempts per probe before it is reported failed.
    #[serde(default = "defaults::health_max_tries")]
    pub max_tries: u32,
    /// Delay before the second attempt.
    #[serde(default = "defaults::health_interval_ms")]
    pub interval_ms: u64,
    /// Multiplier applied to the delay after every failed attempt.
    #[serde(default = "defaults::health_backoff")]
    pub backoff: f64,
    #[serde(default = "defaults::health_max_interval_ms")]
    pub max_interval_ms: u64,
    /// Upper bound for a single attempt.
    #[serde(default = "defaults::health_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self {
            max_tries: defaults::health_max_tries(),
            interval_ms: defaults::health_interval_ms(),
            backoff: defaults::health_backoff(),
            max_interval_ms: defaults::health_max_interval_ms(),
            timeout_ms: defaults::health_timeout_ms(),
        }
    }
}

impl HealthCheckConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn max_interval(&self) -> Duration {
        Duration::from_millis(self.max_interval_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

// ---------------------------------------------------------------------------
// Extensions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtensionsConfig {
    /// Names of the points that accept handlers.
    #[serde(default)]
    pub enabled: Vec<String>,
}

// ---------------------------------------------------------------------------
// Shutdown
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShutdownConfig {
    /// Deadline for `close()` once shutdown was requested.
    #[serde(default = "defaults::shutdown_timeout_ms")]
    pub timeout_ms: u64,
    /// Process exit status used when close fails or misses the deadline.
    #[serde(default = "defaults::shutdown_exit_code")]
    pub exit_code: i32,
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            timeout_ms: defaults::shutdown_timeout_ms(),
            exit_code: defaults::shutdown_exit_code(),
        }
    }
}

impl ShutdownConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggingConfig {
    #[serde(default = "defaults::log_level")]
    pub level: String,
    /// Emit JSON lines on the console instead of human-readable output.
    #[serde(default)]
    pub json: bool,
    /// Directory for the rolling NDJSON log file. Console only when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::log_level(),
            json: false,
            dir: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unknown_top_level_keys_become_plugin_config() {
        let yaml = r#"
name: billing
plugins: [amqp, postgres]
amqp:
  host: rabbitmq
  prefetch: 10
healthChecks:
  maxTries: 5
"#;
        let config: ServiceConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.name, "billing");
        assert_eq!(config.plugins, vec!["amqp", "postgres"]);
        assert_eq!(config.plugin_config("amqp"), json!({"host": "rabbitmq", "prefetch": 10}));
        assert_eq!(config.plugin_config("postgres"), Value::Null);
        assert_eq!(config.health_checks.max_tries, 5);
        assert_eq!(config.health_checks.timeout_ms, defaults::DEFAULT_HEALTH_TIMEOUT_MS);
        assert!(!config.plugin_settings.contains_key("healthChecks"));
    }

    #[test]
    fn empty_document_uses_defaults() {
        let config: ServiceConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config.shutdown.exit_code, 128);
        assert_eq!(config.shutdown.timeout(), Duration::from_secs(10));
        assert_eq!(config.logging.level, "info");
        assert!(config.extensions.enabled.is_empty());
    }
}
