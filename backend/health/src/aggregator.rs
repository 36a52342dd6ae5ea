//! Health Aggregator
//!
//! Runs every probe concurrently, each with its own retry/timeout window, and
//! classifies it as alive or failed. A slow or failing probe never affects the
//! verdict of another one.

use std::panic::AssertUnwindSafe;

use chrono::{DateTime, Utc};
use futures::FutureExt;
use futures::future::join_all;
use orbit_core::{HealthCheck, panic_message};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::policy::RetryPolicy;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Ok,
    Fail,
}

/// A probe that exhausted its retry budget.
#[derive(Debug, Clone, Serialize)]
pub struct ProbeFailure {
    pub name: String,
    pub error: String,
    pub attempts: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthSummary {
    pub status: HealthStatus,
    /// Names of probes that resolved, in registration order.
    pub alive: Vec<String>,
    /// Names of probes that failed, in registration order.
    pub failed: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<ProbeFailure>,
    pub checked_at: DateTime<Utc>,
}

impl HealthSummary {
    pub fn is_ok(&self) -> bool {
        self.status == HealthStatus::Ok
    }
}

#[derive(Debug, Clone, Default)]
pub struct HealthAggregator {
    policy: RetryPolicy,
}

impl HealthAggregator {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Evaluate all probes and build the summary.
    pub async fn evaluate(&self, checks: &[HealthCheck]) -> HealthSummary {
        let outcomes = join_all(checks.iter().map(|check| self.run_probe(check))).await;

        let mut alive = Vec::new();
        let mut failed = Vec::new();
        let mut failures = Vec::new();
        for (check, outcome) in checks.iter().zip(outcomes) {
            match outcome {
                Ok(()) => alive.push(check.name.clone()),
                Err(failure) => {
                    failed.push(check.name.clone());
                    failures.push(failure);
                }
            }
        }

        let status = if failed.is_empty() { HealthStatus::Ok } else { HealthStatus::Fail };
        info!(alive = alive.len(), failed = failed.len(), ?status, "Health check complete");
        HealthSummary { status, alive, failed, failures, checked_at: Utc::now() }
    }

    async fn run_probe(&self, check: &HealthCheck) -> Result<(), ProbeFailure> {
        let attempts = self.policy.attempts();
        let mut last_error = String::new();

        for attempt in 1..=attempts {
            match self.attempt(check).await {
                Ok(()) => {
                    debug!(probe = %check.name, attempt, "Probe alive");
                    return Ok(());
                }
                Err(e) => {
                    debug!(probe = %check.name, attempt, error = %e, "Probe attempt failed");
                    last_error = e;
                }
            }
            if attempt < attempts {
                tokio::time::sleep(self.policy.delay_after(attempt)).await;
            }
        }

        warn!(probe = %check.name, attempts, error = %last_error, "Probe failed");
        Err(ProbeFailure { name: check.name.clone(), error: last_error, attempts })
    }

    async fn attempt(&self, check: &HealthCheck) -> Result<(), String> {
        let call = AssertUnwindSafe(check.probe.check()).catch_unwind();
        match tokio::time::timeout(self.policy.timeout, call).await {
            Ok(Ok(Ok(_))) => Ok(()),
            Ok(Ok(Err(e))) => Err(format!("{e:#}")),
            Ok(Err(panic)) => Err(format!("probe panicked: {}", panic_message(panic.as_ref()))),
            Err(_) => Err(format!("timed out after {:?}", self.policy.timeout)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orbit_core::HealthProbe;
    use serde_json::Value;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    fn policy(max_tries: u32) -> RetryPolicy {
        RetryPolicy {
            max_tries,
            interval: Duration::from_millis(10),
            backoff: 1.0,
            max_interval: Duration::from_millis(10),
            timeout: Duration::from_millis(50),
        }
    }

    fn check(name: &str, probe: impl HealthProbe + 'static) -> HealthCheck {
        HealthCheck::new(name, Arc::new(probe))
    }

    fn passing(name: &str) -> HealthCheck {
        check(name, || async { anyhow::Ok(Value::Null) })
    }

    fn failing(name: &str) -> HealthCheck {
        check(name, || async { Err::<Value, _>(anyhow::anyhow!("connection refused")) })
    }

    #[tokio::test(start_paused = true)]
    async fn one_failing_one_passing() {
        let aggregator = HealthAggregator::new(policy(2));
        let summary = aggregator.evaluate(&[failing("amqp"), passing("postgres")]).await;
        assert_eq!(summary.status, HealthStatus::Fail);
        assert_eq!(summary.alive, vec!["postgres"]);
        assert_eq!(summary.failed, vec!["amqp"]);
        assert_eq!(summary.failures[0].attempts, 2);
        assert!(summary.failures[0].error.contains("connection refused"));
    }

    #[tokio::test(start_paused = true)]
    async fn every_probe_is_classified() {
        let slow = check("slow", || async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            anyhow::Ok(Value::Null)
        });
        let panicky = check("panicky", || async {
            if true {
                panic!("probe bug");
            }
            anyhow::Ok(Value::Null)
        });
        let checks = vec![passing("a"), failing("b"), slow, panicky, passing("c")];

        let summary = HealthAggregator::new(policy(3)).evaluate(&checks).await;
        assert_eq!(summary.alive.len() + summary.failed.len(), checks.len());
        assert_eq!(summary.alive, vec!["a", "c"]);
        assert_eq!(summary.failed, vec!["b", "slow", "panicky"]);
        assert!(summary.failures[1].error.starts_with("timed out"));
        assert!(summary.failures[2].error.contains("probe bug"));
    }

    #[tokio::test(start_paused = true)]
    async fn flaky_probe_recovers_within_budget() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);
        let flaky = check("redis", move || {
            let counter = Arc::clone(&counter);
            async move {
                if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                    anyhow::bail!("loading dataset");
                }
                anyhow::Ok(Value::Null)
            }
        });

        let summary = HealthAggregator::new(policy(3)).evaluate(&[flaky]).await;
        assert!(summary.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn no_probes_is_ok() {
        let summary = HealthAggregator::default().evaluate(&[]).await;
        assert!(summary.is_ok());
        assert!(summary.alive.is_empty() && summary.failed.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn summary_serializes_in_wire_shape() {
        let summary = HealthAggregator::new(policy(1)).evaluate(&[passing("http")]).await;
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["alive"], serde_json::json!(["http"]));
        assert_eq!(json["failed"], serde_json::json!([]));
        assert!(json.get("failures").is_none());
    }
}
