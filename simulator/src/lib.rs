//! FxGuard Simulator
//!
//! Load testing of the conversion engine and simulated health readings for
//! dashboard widgets.

pub mod harness;
pub mod health;
pub mod metrics;
pub mod scenario;

use fxguard_common::SystemClock;
use fxguard_fx::{default_engine, StdRandomSource};

pub use harness::{HarnessConfig, LoadProbe, LoadTestError, LoadTestHarness, LoadTestRequest, LoadTestResult};
pub use health::{get_system_health_metrics, SystemHealthMetrics};
pub use metrics::RunMetrics;
pub use scenario::Scenario;

/// Run a load test against the shared engine with default harness settings.
pub async fn execute_stress_test(
    duration_ms: u64,
    concurrency: u32,
    request_rate: u32,
) -> Result<LoadTestResult, LoadTestError> {
    LoadTestHarness::new(default_engine(), HarnessConfig::default())
        .run(LoadTestRequest::new(duration_ms, concurrency, request_rate))
        .await
}

/// Health snapshot from entropy and the wall clock.
pub async fn system_health_metrics() -> SystemHealthMetrics {
    get_system_health_metrics(&StdRandomSource::from_entropy(), &SystemClock)
}
