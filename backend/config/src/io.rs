//! Config file discovery, loading and environment overrides.

use crate::schema::ServiceConfig;
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// Default config file name within the config directory.
const CONFIG_FILE_NAME: &str = "service.yaml";

/// Overrides the configured log level.
pub const ENV_LOG_LEVEL: &str = "ORBIT_LOG_LEVEL";
/// Comma-separated plugin list replacing `plugins`.
pub const ENV_PLUGINS: &str = "ORBIT_PLUGINS";

/// Resolve the config directory.
/// Priority: `ORBIT_CONFIG_DIR` env > `~/.orbit/` > `./.orbit`
pub fn config_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("ORBIT_CONFIG_DIR") {
        return PathBuf::from(dir);
    }
    match dirs::home_dir() {
        Some(home) => home.join(".orbit"),
        None => PathBuf::from(".orbit"),
    }
}

/// Resolve the full path to the main config file.
pub fn config_file_path(config_dir: &Path) -> PathBuf {
    config_dir.join(CONFIG_FILE_NAME)
}

/// Load and parse the config from disk.
///
/// Returns `Ok(Default::default())` if the file doesn't exist (first run).
pub async fn load_config(path: &Path) -> Result<ServiceConfig> {
    if !path.exists() {
        debug!(path = %path.display(), "Config file does not exist; using defaults");
        return Ok(ServiceConfig::default());
    }

    let raw = fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: ServiceConfig = serde_yaml::from_str(&raw)
        .with_context(|| format!("Failed to parse config YAML at: {}", path.display()))?;

    info!(path = %path.display(), plugins = config.plugins.len(), "Loaded config");
    Ok(config)
}

/// Apply `ORBIT_*` overrides from the process environment.
pub fn apply_env_overrides(config: ServiceConfig) -> ServiceConfig {
    apply_env_overrides_with(config, &std::env::vars().collect())
}

/// Apply overrides from a provided map (useful for testing).
pub fn apply_env_overrides_with(
    mut config: ServiceConfig,
    env: &HashMap<String, String>,
) -> ServiceConfig {
    if let Some(level) = env.get(ENV_LOG_LEVEL).filter(|v| !v.trim().is_empty()) {
        debug!(level = %level, "Log level overridden from environment");
        config.logging.level = level.trim().to_string();
    }
    if let Some(list) = env.get(ENV_PLUGINS) {
        config.plugins = list
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(String::from)
            .collect();
        debug!(plugins = ?config.plugins, "Plugin list overridden from environment");
    }
    config
}
