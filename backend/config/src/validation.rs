//! Config validation: checks with field paths and user-friendly messages.

use std::collections::HashSet;

use orbit_core::extension_points;
use thiserror::Error;

use crate::schema::{RESERVED_KEYS, ServiceConfig};

/// A config validation error with field path and message.
#[derive(Debug, Error)]
#[error("Config validation error at '{path}': {message}")]
pub struct ConfigValidationError {
    pub path: String,
    pub message: String,
}

/// A collection of validation errors found in one pass.
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }

    fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }
}

/// Validate the config and return a report of all errors and warnings.
pub fn validate(config: &ServiceConfig) -> ValidationReport {
    let mut report = ValidationReport::default();
    validate_plugins(config, &mut report);
    validate_health_checks(config, &mut report);
    validate_extensions(config, &mut report);
    validate_shutdown(config, &mut report);
    report
}

fn validate_plugins(config: &ServiceConfig, report: &mut ValidationReport) {
    if config.plugins.is_empty() {
        report.warn("plugins", "No plugins configured; connect() will be a no-op");
    }
    let mut seen = HashSet::new();
    for (i, name) in config.plugins.iter().enumerate() {
        if name.trim().is_empty() {
            report.error(format!("plugins[{i}]"), "Plugin name cannot be empty");
        } else if RESERVED_KEYS.contains(&name.as_str()) {
            report.error(
                format!("plugins[{i}]"),
                format!("Plugin name '{name}' is reserved for a kernel config section"),
            );
        } else if !seen.insert(name.as_str()) {
            report.error(format!("plugins[{i}]"), format!("Plugin '{name}' is listed more than once"));
        }
    }
}

fn validate_health_checks(config: &ServiceConfig, report: &mut ValidationReport) {
    let hc = &config.health_checks;
    if hc.max_tries == 0 {
        report.error("healthChecks.maxTries", "maxTries must be > 0");
    }
    if hc.timeout_ms == 0 {
        report.error("healthChecks.timeoutMs", "timeoutMs must be > 0");
    }
    if !hc.backoff.is_finite() || hc.backoff < 1.0 {
        report.error("healthChecks.backoff", "backoff must be a finite number >= 1");
    }
    if hc.max_interval_ms < hc.interval_ms {
        report.warn(
            "healthChecks.maxIntervalMs",
            "maxIntervalMs is below intervalMs; every retry waits maxIntervalMs",
        );
    }
}

fn validate_extensions(config: &ServiceConfig, report: &mut ValidationReport) {
    for (i, point) in config.extensions.enabled.iter().enumerate() {
        if point.trim().is_empty() {
            report.error(format!("extensions.enabled[{i}]"), "Extension point name cannot be empty");
        } else if !extension_points::is_known(point) {
            report.warn(
                format!("extensions.enabled[{i}]"),
                format!("'{point}' is not a conventional extension point"),
            );
        }
    }
}

fn validate_shutdown(config: &ServiceConfig, report: &mut ValidationReport) {
    if config.shutdown.timeout_ms == 0 {
        report.error("shutdown.timeoutMs", "timeoutMs must be > 0");
    }
    if config.shutdown.exit_code == 0 {
        report.warn("shutdown.exitCode", "exitCode 0 hides failed shutdowns from the supervisor");
    }
}
