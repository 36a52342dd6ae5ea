//! Health aggregation for orbit services.
//!
//! Walks every registered health probe under a retry/timeout policy and folds
//! the outcomes into an alive/failed summary.

pub mod aggregator;
pub mod policy;

pub use aggregator::{HealthAggregator, HealthStatus, HealthSummary, ProbeFailure};
pub use policy::RetryPolicy;
