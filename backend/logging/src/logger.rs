//! Structured Logger
//!
//! Wraps `tracing` to provide console output (plain or JSON), an optional
//! daily-rotated NDJSON file, and environment-based level control.

use orbit_config::LoggingConfig;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// File name prefix of the rolling log, e.g. `orbit.log.2026-10-18`.
const LOG_FILE_PREFIX: &str = "orbit.log";

/// Initialize the global structured logger.
///
/// `RUST_LOG` wins over `config.level`. Returns `false` when a global
/// subscriber was already installed (tests, embedding hosts).
pub fn init_logger(config: &LoggingConfig) -> bool {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let (plain_layer, json_layer) = if config.json {
        (None, Some(fmt::layer().json().with_writer(std::io::stdout)))
    } else {
        (
            Some(
                fmt::layer()
                    .with_writer(std::io::stdout)
                    .with_target(false)
                    .with_ansi(true),
            ),
            None,
        )
    };

    let file_layer = config.dir.as_ref().map(|dir| {
        let appender = RollingFileAppender::new(Rotation::DAILY, dir, LOG_FILE_PREFIX);
        fmt::layer().json().with_writer(appender).with_ansi(false)
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(plain_layer)
        .with(json_layer)
        .with(file_layer)
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_init_reports_existing_subscriber() {
        let config = LoggingConfig::default();
        let _ = init_logger(&config);
        assert!(!init_logger(&config));
    }
}
