use std::time::Duration;

use thiserror::Error;

/// Top-level error type for the orbit kernel.
///
/// Plugin-supplied handlers fail with `anyhow::Error`; the kernel wraps those
/// once at its boundary so callers always see which plugin, hook or extension
/// point the failure came from. The original error stays reachable through
/// `std::error::Error::source`.
#[derive(Debug, Error)]
pub enum OrbitError {
    #[error("plugin \"{name}\" not found in any lookup location (searched: {searched})")]
    PluginNotFound { name: String, searched: String },

    #[error("plugin \"{0}\" is listed more than once")]
    DuplicatePlugin(String),

    #[error("unknown lifecycle phase: {0}")]
    UnknownPhase(String),

    #[error("plugin \"{plugin}\" failed to attach: {source}")]
    Attach {
        plugin: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("connector of plugin \"{plugin}\" failed: {source}")]
    Connect {
        plugin: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("destructor of plugin \"{plugin}\" failed: {source}")]
    Close {
        plugin: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("listener #{index} of hook \"{event}\" failed: {source}")]
    Hook {
        event: String,
        index: usize,
        #[source]
        source: anyhow::Error,
    },

    #[error("Not Supported: {0}")]
    NotSupported(String),

    #[error("handler for extension point \"{point}\" failed: {source}")]
    Extension {
        point: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("unhandled service error: {0}")]
    Unhandled(#[source] anyhow::Error),

    #[error("shutdown did not complete within {0:?}")]
    ShutdownTimeout(Duration),

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T, E = OrbitError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn not_supported_message_is_verbatim() {
        let err = OrbitError::NotSupported("postPreHandler".into());
        assert_eq!(err.to_string(), "Not Supported: postPreHandler");
    }

    #[test]
    fn attach_keeps_original_error_as_source() {
        let err = OrbitError::Attach {
            plugin: "amqp".into(),
            source: anyhow::anyhow!("broker unreachable"),
        };
        assert!(err.to_string().contains("amqp"));
        assert_eq!(err.source().unwrap().to_string(), "broker unreachable");
    }
}
