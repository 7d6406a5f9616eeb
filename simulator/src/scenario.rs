//! Named load-test scenarios.

use serde::{Deserialize, Serialize};

use crate::harness::{LoadTestError, LoadTestRequest};

/// A named load profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    /// Scenario name.
    pub name: String,
    /// Description.
    pub description: String,
    /// Requested duration in milliseconds.
    pub duration_ms: u64,
    /// Calls in flight per batch, at most.
    pub concurrency: u32,
    /// Target batches per second.
    pub request_rate: u32,
}

impl Scenario {
    /// Names accepted by [`Scenario::load`].
    pub const NAMES: [&'static str; 4] = ["smoke", "steady", "burst", "soak"];

    /// Load a scenario by name.
    pub fn load(name: &str) -> Result<Self, LoadTestError> {
        match name {
            "smoke" => Ok(Self::smoke()),
            "steady" => Ok(Self::steady()),
            "burst" => Ok(Self::burst()),
            "soak" => Ok(Self::soak()),
            _ => Err(LoadTestError::UnknownScenario(name.to_string())),
        }
    }

    /// Harness request for this scenario.
    pub fn request(&self) -> LoadTestRequest {
        LoadTestRequest::new(self.duration_ms, self.concurrency, self.request_rate)
    }

    /// Quick sanity run.
    fn smoke() -> Self {
        Self {
            name: "smoke".to_string(),
            description: "Short low-volume run to check the pipeline end to end".to_string(),
            duration_ms: 2_000,
            concurrency: 2,
            request_rate: 5,
        }
    }

    fn steady() -> Self {
        Self {
            name: "steady".to_string(),
            description: "Sustained moderate load".to_string(),
            duration_ms: 10_000,
            concurrency: 5,
            request_rate: 10,
        }
    }

    /// Wide batches at a high rate.
    fn burst() -> Self {
        Self {
            name: "burst".to_string(),
            description: "Short burst of wide concurrent batches".to_string(),
            duration_ms: 5_000,
            concurrency: 20,
            request_rate: 50,
        }
    }

    fn soak() -> Self {
        Self {
            name: "soak".to_string(),
            description: "Longest permitted run at low rate".to_string(),
            duration_ms: 30_000,
            concurrency: 5,
            request_rate: 5,
        }
    }
}
