//! Lifecycle phases and their fixed startup order.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::OrbitError;

/// One stage of the startup/shutdown ordering.
///
/// The declaration order is the system-wide phase priority: `connect` walks it
/// top to bottom, `close` bottom to top.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecyclePhase {
    /// Process-level facilities every other plugin may rely on.
    Essential,
    /// Storage backends.
    Database,
    /// Message brokers and network listeners.
    Transport,
    /// Application-level services built on top of the rest.
    Application,
}

impl LifecyclePhase {
    /// Phase priority list, ascending.
    pub const ORDER: [LifecyclePhase; 4] = [
        LifecyclePhase::Essential,
        LifecyclePhase::Database,
        LifecyclePhase::Transport,
        LifecyclePhase::Application,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Essential => "essential",
            Self::Database => "database",
            Self::Transport => "transport",
            Self::Application => "application",
        }
    }

    /// Phases in teardown order.
    pub fn reversed() -> impl Iterator<Item = LifecyclePhase> {
        Self::ORDER.into_iter().rev()
    }
}

impl fmt::Display for LifecyclePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LifecyclePhase {
    type Err = OrbitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ORDER
            .into_iter()
            .find(|phase| phase.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| OrbitError::UnknownPhase(s.to_string()))
    }
}
