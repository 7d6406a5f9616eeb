//! Batched load testing of the conversion engine.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use fxguard_common::time::constants::{DEFAULT_CALL_TIMEOUT, MAX_LOAD_TEST_DURATION};
use fxguard_common::time::DurationExt;
use fxguard_common::{elapsed_ms, Clock, ErrorKind, RawValue, Timestamp};
use fxguard_fx::{convert_with, ConversionEngine, ConversionOutcome};
use futures::future::join_all;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::metrics::RunMetrics;

/// Errors rejecting a load-test request before it starts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadTestError {
    #[error("Concurrency must be at least 1")]
    InvalidConcurrency,

    #[error("Request rate must be at least 1 request per second")]
    InvalidRequestRate,

    #[error("Unknown scenario: {0} (expected one of smoke, steady, burst, soak)")]
    UnknownScenario(String),
}

/// Fixed input every load-test call converts.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadProbe {
    pub amount: f64,
    pub from: String,
    pub to: String,
}

impl Default for LoadProbe {
    fn default() -> Self {
        Self {
            amount: 100.0,
            from: "USD".to_string(),
            to: "EUR".to_string(),
        }
    }
}

/// Harness settings.
#[derive(Debug, Clone, PartialEq)]
pub struct HarnessConfig {
    /// Requested durations are capped at this value.
    pub max_duration: Duration,
    /// Input used for every call.
    pub probe: LoadProbe,
    /// Calls still running after this long are counted as network failures.
    pub call_timeout: Option<Duration>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            max_duration: MAX_LOAD_TEST_DURATION,
            probe: LoadProbe::default(),
            call_timeout: Some(DEFAULT_CALL_TIMEOUT),
        }
    }
}

/// Shape of a single load-test run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTestRequest {
    pub duration: Duration,
    /// Upper bound on calls in flight at once.
    pub concurrency: u32,
    /// Target batches per second.
    pub request_rate: u32,
}

impl LoadTestRequest {
    pub fn new(duration_ms: u64, concurrency: u32, request_rate: u32) -> Self {
        Self {
            duration: Duration::from_millis(duration_ms),
            concurrency,
            request_rate,
        }
    }

    pub fn validate(&self) -> Result<(), LoadTestError> {
        if self.concurrency == 0 {
            return Err(LoadTestError::InvalidConcurrency);
        }
        if self.request_rate == 0 {
            return Err(LoadTestError::InvalidRequestRate);
        }
        Ok(())
    }

    /// Calls issued per batch.
    pub fn batch_size(&self) -> usize {
        self.concurrency.min(self.request_rate) as usize
    }

    /// Pause after each batch completes, never shorter than 1 µs.
    pub fn pacing(&self) -> Duration {
        Duration::from_micros((1_000_000 / u64::from(self.request_rate.max(1))).max(1))
    }
}

/// Aggregated statistics for one run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadTestResult {
    /// Always true: individual failures are counted, not propagated.
    pub success: bool,
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    /// Milliseconds.
    pub average_response_time: f64,
    pub max_response_time: f64,
    pub min_response_time: f64,
    pub p50_response_time: f64,
    pub p95_response_time: f64,
    pub p99_response_time: f64,
    /// Percentage in `[0, 100]`.
    pub error_rate: f64,
    /// Requests per second of elapsed time.
    pub throughput: f64,
    /// Actual elapsed milliseconds.
    pub duration: f64,
    pub errors_by_kind: BTreeMap<ErrorKind, u64>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: Timestamp,
}

impl LoadTestResult {
    fn from_metrics(metrics: &RunMetrics, elapsed_ms: f64, timestamp: Timestamp) -> Self {
        Self {
            success: true,
            total_requests: metrics.total_requests,
            successful_requests: metrics.successful_requests,
            failed_requests: metrics.failed_requests,
            average_response_time: metrics.average_response_time(),
            max_response_time: metrics.max_response_time(),
            min_response_time: metrics.min_response_time(),
            p50_response_time: metrics.percentile_response_time(50),
            p95_response_time: metrics.percentile_response_time(95),
            p99_response_time: metrics.percentile_response_time(99),
            error_rate: metrics.error_rate(),
            throughput: metrics.throughput(elapsed_ms),
            duration: elapsed_ms,
            errors_by_kind: metrics.errors_by_kind.clone(),
            timestamp,
        }
    }
}

/// Drives the conversion engine in paced, fully awaited batches.
pub struct LoadTestHarness {
    engine: Arc<ConversionEngine>,
    clock: Arc<dyn Clock>,
    config: HarnessConfig,
}

impl LoadTestHarness {
    /// Harness sharing the engine's clock.
    pub fn new(engine: Arc<ConversionEngine>, config: HarnessConfig) -> Self {
        let clock = Arc::clone(engine.clock());
        Self {
            engine,
            clock,
            config,
        }
    }

    /// Use a separate clock for deadlines and pacing.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Run batches until the (capped) deadline passes.
    ///
    /// Batch N+1 never starts before every call in batch N has finished.
    #[instrument(skip(self), fields(
        duration_ms = request.duration.as_millis() as u64,
        concurrency = request.concurrency,
        request_rate = request.request_rate
    ))]
    pub async fn run(&self, request: LoadTestRequest) -> Result<LoadTestResult, LoadTestError> {
        request.validate()?;

        let duration = request.duration.min(self.config.max_duration);
        if duration < request.duration {
            warn!(
                requested_ms = request.duration.as_millis() as u64,
                capped_ms = duration.as_millis() as u64,
                "Load test duration capped"
            );
        }

        let batch_size = request.batch_size();
        let pacing = request.pacing();
        let probe = self.probe_values();

        let start = self.clock.now();
        let deadline = start + chrono::Duration::from_std(duration).unwrap_or_else(|_| chrono::Duration::zero());
        let mut metrics = RunMetrics::new();
        let mut batches = 0u64;

        info!(batch_size, pacing_ms = pacing.as_millis() as u64, "Starting load test");

        while self.clock.now() < deadline {
            let calls = (0..batch_size).map(|_| self.call(&probe));
            for result in join_all(calls).await {
                match result {
                    Some(outcome) => metrics.record(&outcome),
                    None => metrics.record_timeout(self.timeout_ms()),
                }
            }
            batches += 1;

            // Never pace past the deadline.
            let remaining = (deadline - self.clock.now()).as_std();
            let pause = pacing.min(remaining);
            if !pause.is_zero() {
                self.clock.sleep(pause).await;
            }
        }

        let finished = self.clock.now();
        let result = LoadTestResult::from_metrics(&metrics, elapsed_ms(start, finished), finished);

        info!(
            batches,
            total = result.total_requests,
            failed = result.failed_requests,
            error_rate = result.error_rate,
            throughput = result.throughput,
            "Load test complete"
        );

        Ok(result)
    }

    fn probe_values(&self) -> (RawValue, RawValue, RawValue) {
        let probe = &self.config.probe;
        (
            RawValue::Number(probe.amount),
            RawValue::Text(probe.from.clone()),
            RawValue::Text(probe.to.clone()),
        )
    }

    fn timeout_ms(&self) -> f64 {
        self.config
            .call_timeout
            .map(|t| t.as_secs_f64() * 1000.0)
            .unwrap_or(0.0)
    }

    /// One conversion; `None` when the call timed out.
    async fn call(&self, probe: &(RawValue, RawValue, RawValue)) -> Option<ConversionOutcome> {
        let (amount, from, to) = probe;
        let call = convert_with(&self.engine, amount, from, to);
        match self.config.call_timeout {
            Some(limit) => match tokio::time::timeout(limit, call).await {
                Ok(outcome) => Some(outcome),
                Err(_) => {
                    debug!(timeout_ms = limit.as_millis() as u64, "Conversion timed out");
                    None
                }
            },
            None => Some(call.await),
        }
    }
}
