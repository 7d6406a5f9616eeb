//! Simulated transport faults.

use fxguard_common::{ErrorKind, Severity};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::random::RandomSource;

/// Probability of injecting a fault into a single conversion.
pub const DEFAULT_FAULT_PROBABILITY: f64 = 0.001;

/// A transient failure the engine can inject after validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaultKind {
    NetworkTimeout,
    NetworkConnection,
    RateLimited,
    ServerError,
    BadResponse,
}

impl FaultKind {
    pub const ALL: [FaultKind; 5] = [
        FaultKind::NetworkTimeout,
        FaultKind::NetworkConnection,
        FaultKind::RateLimited,
        FaultKind::ServerError,
        FaultKind::BadResponse,
    ];

    pub fn error_kind(&self) -> ErrorKind {
        match self {
            FaultKind::NetworkTimeout | FaultKind::NetworkConnection => ErrorKind::Network,
            FaultKind::RateLimited => ErrorKind::RateLimit,
            FaultKind::ServerError => ErrorKind::Server,
            FaultKind::BadResponse => ErrorKind::Service,
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            FaultKind::NetworkTimeout | FaultKind::RateLimited => Severity::Medium,
            FaultKind::NetworkConnection | FaultKind::ServerError | FaultKind::BadResponse => {
                Severity::High
            }
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            FaultKind::NetworkTimeout => "Request timed out while contacting the rate service",
            FaultKind::NetworkConnection => "Connection to the rate service failed",
            FaultKind::RateLimited => "Rate limit exceeded, please retry later",
            FaultKind::ServerError => "Rate service returned an internal server error",
            FaultKind::BadResponse => "Rate service returned an invalid response",
        }
    }
}

impl fmt::Display for FaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Fault injection settings.
#[derive(Debug, Clone, PartialEq)]
pub struct FaultConfig {
    /// Chance in `[0, 1]` that a validated request is failed.
    pub probability: f64,
    /// Kinds to choose from, uniformly. Empty disables injection.
    pub kinds: Vec<FaultKind>,
}

impl Default for FaultConfig {
    fn default() -> Self {
        Self {
            probability: DEFAULT_FAULT_PROBABILITY,
            kinds: FaultKind::ALL.to_vec(),
        }
    }
}

impl FaultConfig {
    /// Configuration that never injects.
    pub fn disabled() -> Self {
        Self {
            probability: 0.0,
            kinds: FaultKind::ALL.to_vec(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.probability > 0.0 && !self.kinds.is_empty()
    }

    /// Decide whether this request fails.
    ///
    /// Consumes one draw for the gate and, if it fires, one for the kind.
    /// Nothing is drawn when injection is disabled.
    pub fn roll(&self, random: &dyn RandomSource) -> Option<FaultKind> {
        if !self.is_enabled() || !random.chance(self.probability) {
            return None;
        }
        Some(self.kinds[random.pick_index(self.kinds.len())])
    }
}
