//! Time utilities and the injectable clock.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;

/// Simulation timing constants.
pub mod constants {
    use std::time::Duration;

    /// Lower bound of the simulated transport delay (inclusive).
    pub const SIMULATED_LATENCY_MIN: Duration = Duration::from_millis(50);

    /// Upper bound of the simulated transport delay (exclusive).
    pub const SIMULATED_LATENCY_MAX: Duration = Duration::from_millis(150);

    /// Hard ceiling on a single load-test run.
    pub const MAX_LOAD_TEST_DURATION: Duration = Duration::from_secs(30);

    /// Default per-call timeout applied by the load-test harness.
    pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(5);
}

/// A timestamp with timezone (always UTC).
pub type Timestamp = DateTime<Utc>;

/// Get the current timestamp.
pub fn now() -> Timestamp {
    Utc::now()
}

/// Milliseconds elapsed between two timestamps, never negative.
pub fn elapsed_ms(start: Timestamp, end: Timestamp) -> f64 {
    let micros = end
        .signed_duration_since(start)
        .num_microseconds()
        .unwrap_or(i64::MAX);
    (micros.max(0) as f64) / 1000.0
}

/// Duration conversion between chrono and std.
pub trait DurationExt {
    fn as_std(&self) -> std::time::Duration;
}

impl DurationExt for Duration {
    fn as_std(&self) -> std::time::Duration {
        self.to_std().unwrap_or(std::time::Duration::ZERO)
    }
}

/// Source of time and suspension for the conversion pipeline.
#[async_trait]
pub trait Clock: Send + Sync {
    /// Current time.
    fn now(&self) -> Timestamp;

    /// Suspend the caller for `duration`.
    async fn sleep(&self, duration: std::time::Duration);
}

/// Wall clock backed by the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

#[async_trait]
impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        now()
    }

    async fn sleep(&self, duration: std::time::Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Virtual clock whose sleeps complete immediately.
///
/// Every `sleep` moves the clock forward by the requested duration, so
/// measured latencies and deadlines behave as if time had passed.
#[derive(Debug)]
pub struct ManualClock {
    current: Mutex<Timestamp>,
}

impl ManualClock {
    /// Create a clock frozen at `start`.
    pub fn new(start: Timestamp) -> Self {
        Self {
            current: Mutex::new(start),
        }
    }

    /// Create a clock frozen at the Unix epoch.
    pub fn at_epoch() -> Self {
        Self::new(DateTime::<Utc>::default())
    }

    /// Move the clock forward.
    pub fn advance(&self, duration: std::time::Duration) {
        let Ok(step) = Duration::from_std(duration) else {
            return;
        };
        let mut current = self.current.lock();
        if let Some(next) = current.checked_add_signed(step) {
            *current = next;
        }
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::at_epoch()
    }
}

#[async_trait]
impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        *self.current.lock()
    }

    async fn sleep(&self, duration: std::time::Duration) {
        self.advance(duration);
    }
}
