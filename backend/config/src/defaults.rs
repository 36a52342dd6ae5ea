//! Default values for the service configuration.

pub const DEFAULT_SERVICE_NAME: &str = "orbit";

/// Attempts per health probe.
pub const DEFAULT_HEALTH_MAX_TRIES: u32 = 3;
pub const DEFAULT_HEALTH_INTERVAL_MS: u64 = 500;
pub const DEFAULT_HEALTH_BACKOFF: f64 = 1.0;
pub const DEFAULT_HEALTH_MAX_INTERVAL_MS: u64 = 5_000;
pub const DEFAULT_HEALTH_TIMEOUT_MS: u64 = 5_000;

/// Deadline for a supervised `close()`.
pub const DEFAULT_SHUTDOWN_TIMEOUT_MS: u64 = 10_000;

/// Exit status reserved for a failed or timed-out shutdown.
pub const DEFAULT_SHUTDOWN_EXIT_CODE: i32 = 128;

pub const DEFAULT_LOG_LEVEL: &str = "info";

pub(crate) fn service_name() -> String {
    DEFAULT_SERVICE_NAME.to_string()
}

pub(crate) fn health_max_tries() -> u32 {
    DEFAULT_HEALTH_MAX_TRIES
}

pub(crate) fn health_interval_ms() -> u64 {
    DEFAULT_HEALTH_INTERVAL_MS
}

pub(crate) fn health_backoff() -> f64 {
    DEFAULT_HEALTH_BACKOFF
}

pub(crate) fn health_max_interval_ms() -> u64 {
    DEFAULT_HEALTH_MAX_INTERVAL_MS
}

pub(crate) fn health_timeout_ms() -> u64 {
    DEFAULT_HEALTH_TIMEOUT_MS
}

pub(crate) fn shutdown_timeout_ms() -> u64 {
    DEFAULT_SHUTDOWN_TIMEOUT_MS
}

pub(crate) fn shutdown_exit_code() -> i32 {
    DEFAULT_SHUTDOWN_EXIT_CODE
}

pub(crate) fn log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}
