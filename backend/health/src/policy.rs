use std::time::Duration;

use orbit_config::HealthCheckConfig;

/// Per-probe retry schedule.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_tries: u32,
    pub interval: Duration,
    pub backoff: f64,
    pub max_interval: Duration,
    pub timeout: Duration,
}

impl RetryPolicy {
    /// Attempts actually made; never below one.
    pub fn attempts(&self) -> u32 {
        self.max_tries.max(1)
    }

    /// Delay to wait after failed attempt number `attempt` (1-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let factor = if self.backoff.is_finite() && self.backoff >= 1.0 { self.backoff } else { 1.0 };
        let mut delay = self.interval.min(self.max_interval);
        for _ in 1..attempt {
            delay = Duration::try_from_secs_f64(delay.as_secs_f64() * factor)
                .unwrap_or(self.max_interval)
                .min(self.max_interval);
        }
        delay
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&HealthCheckConfig::default())
    }
}

impl From<&HealthCheckConfig> for RetryPolicy {
    fn from(config: &HealthCheckConfig) -> Self {
        Self {
            max_tries: config.max_tries,
            interval: config.interval(),
            backoff: config.backoff,
            max_interval: config.max_interval(),
            timeout: config.timeout(),
        }
    }
}
