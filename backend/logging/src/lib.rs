//! Structured logging for orbit services.
//!
//! Handles subscriber setup (console, JSON, rolling NDJSON file) and the
//! dedicated lifecycle event log target.

pub mod event_logger;
pub mod logger;

pub use event_logger::{LIFECYCLE_TARGET, log_lifecycle_event};
pub use logger::init_logger;
