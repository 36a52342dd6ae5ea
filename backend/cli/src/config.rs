use std::path::{Path, PathBuf};

use anyhow::Result;
use orbit_config::{apply_env_overrides, config_dir, config_file_path, load_and_prepare, load_config, ServiceConfig};
use tracing::info;

use crate::builtin::DEFAULT_PLUGINS;

/// `--config` if given, otherwise `service.yaml` in the config directory.
pub fn resolve_path(arg: Option<PathBuf>) -> PathBuf {
    arg.unwrap_or_else(|| config_file_path(&config_dir()))
}

/// Install the global logger from the logging section of `path`. A file that
/// cannot be read yet falls back to default logging; the real load reports
/// the problem.
pub async fn init_logging(path: &Path) {
    let logging = match load_config(path).await {
        Ok(config) => apply_env_overrides(config).logging,
        Err(_) => Default::default(),
    };
    orbit_logging::init_logger(&logging);
}

/// Load, override and validate the configuration. A configuration without
/// plugins gets the built-in defaults.
pub async fn load(path: &Path) -> Result<ServiceConfig> {
    let mut config = load_and_prepare(path).await?;
    if config.plugins.is_empty() {
        config.plugins = DEFAULT_PLUGINS.iter().map(|p| p.to_string()).collect();
    }
    info!(path = %path.display(), service = %config.name, plugins = ?config.plugins, "Configuration loaded");
    Ok(config)
}
