//! `orbit-config`: service configuration management.
//!
//! Provides:
//! - Typed config schema (plugins, health checks, extensions, shutdown, logging)
//! - YAML loading with a defaults fallback
//! - `ORBIT_*` environment overrides
//! - Validation with field paths

pub mod defaults;
pub mod io;
pub mod schema;
pub mod validation;

pub use io::{apply_env_overrides, apply_env_overrides_with, config_dir, config_file_path, load_config};
pub use schema::{RESERVED_KEYS, ExtensionsConfig, HealthCheckConfig, LoggingConfig, ServiceConfig, ShutdownConfig};
pub use validation::{validate, ConfigValidationError, ValidationReport};

use anyhow::{bail, Result};
use std::path::Path;

/// Load a config file, apply environment overrides and validate it.
///
/// This is the main entry point for loading a config at runtime. Warnings are
/// logged; any validation error fails the load.
pub async fn load_and_prepare(path: &Path) -> Result<ServiceConfig> {
    let config = apply_env_overrides(load_config(path).await?);

    let report = validate(&config);
    for warning in &report.warnings {
        tracing::warn!(path = %warning.path, message = %warning.message, "Config warning");
    }
    for error in &report.errors {
        tracing::error!(path = %error.path, message = %error.message, "Config error");
    }
    if let Some(first) = report.errors.first() {
        match report.errors.len() {
            1 => bail!("{first}"),
            n => bail!("{first} (and {} more)", n - 1),
        }
    }

    Ok(config)
}
