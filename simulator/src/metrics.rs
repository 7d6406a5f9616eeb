//! Load-test run metrics.

use std::collections::BTreeMap;

use fxguard_common::ErrorKind;
use fxguard_fx::ConversionOutcome;

/// Counters and timings for a single load-test run.
///
/// Owned by one run; never shared between concurrent runs.
#[derive(Debug, Clone, Default)]
pub struct RunMetrics {
    /// Total requests completed.
    pub total_requests: u64,
    /// Requests that produced a result.
    pub successful_requests: u64,
    /// Requests that failed, for any reason.
    pub failed_requests: u64,
    /// Failures by category.
    pub errors_by_kind: BTreeMap<ErrorKind, u64>,
    /// Response time of every request (ms), in completion order.
    response_times: Vec<f64>,
}

impl RunMetrics {
    /// Create new metrics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one conversion outcome.
    pub fn record(&mut self, outcome: &ConversionOutcome) {
        match outcome.error_type() {
            None => self.record_success(outcome.response_time_ms()),
            Some(kind) => self.record_failure(kind, outcome.response_time_ms()),
        }
    }

    /// Record a call abandoned after `timeout_ms`.
    pub fn record_timeout(&mut self, timeout_ms: f64) {
        self.record_failure(ErrorKind::Network, timeout_ms);
    }

    fn record_success(&mut self, response_time_ms: f64) {
        self.total_requests += 1;
        self.successful_requests += 1;
        self.response_times.push(response_time_ms);
    }

    fn record_failure(&mut self, kind: ErrorKind, response_time_ms: f64) {
        self.total_requests += 1;
        self.failed_requests += 1;
        *self.errors_by_kind.entry(kind).or_insert(0) += 1;
        self.response_times.push(response_time_ms);
    }

    /// Number of timing samples.
    pub fn sample_count(&self) -> usize {
        self.response_times.len()
    }

    /// Mean response time in ms, 0 without samples.
    pub fn average_response_time(&self) -> f64 {
        if self.response_times.is_empty() {
            return 0.0;
        }
        self.response_times.iter().sum::<f64>() / self.response_times.len() as f64
    }

    pub fn max_response_time(&self) -> f64 {
        self.response_times.iter().copied().fold(0.0, f64::max)
    }

    pub fn min_response_time(&self) -> f64 {
        self.response_times
            .iter()
            .copied()
            .reduce(f64::min)
            .unwrap_or(0.0)
    }

    /// Nearest-rank percentile of response times.
    pub fn percentile_response_time(&self, percentile: usize) -> f64 {
        if self.response_times.is_empty() {
            return 0.0;
        }

        let mut sorted = self.response_times.clone();
        sorted.sort_by(f64::total_cmp);

        let idx = (sorted.len() * percentile / 100).min(sorted.len() - 1);
        sorted[idx]
    }

    /// Failed requests as a percentage of all requests.
    pub fn error_rate(&self) -> f64 {
        if self.total_requests == 0 {
            return 0.0;
        }
        100.0 * self.failed_requests as f64 / self.total_requests as f64
    }

    /// Requests per second over `elapsed_ms`.
    pub fn throughput(&self, elapsed_ms: f64) -> f64 {
        if elapsed_ms <= 0.0 {
            return 0.0;
        }
        self.total_requests as f64 / (elapsed_ms / 1000.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fxguard_fx::{ConversionOutcome, FaultKind, FxError};

    fn failure(kind: FaultKind, ms: f64) -> ConversionOutcome {
        ConversionOutcome::from_result(Err(FxError::Fault(kind)), ms)
    }

    #[test]
    fn test_metrics() {
        let mut metrics = RunMetrics::new();

        metrics.record(&failure(FaultKind::ServerError, 200.0));
        metrics.record(&failure(FaultKind::RateLimited, 100.0));
        metrics.record_timeout(150.0);
        metrics.record(&failure(FaultKind::NetworkTimeout, 150.0));

        assert_eq!(metrics.total_requests, 4);
        assert_eq!(metrics.failed_requests, 4);
        assert_eq!(metrics.average_response_time(), 150.0);
        assert_eq!(metrics.max_response_time(), 200.0);
        assert_eq!(metrics.min_response_time(), 100.0);
        assert_eq!(metrics.error_rate(), 100.0);
        assert_eq!(metrics.errors_by_kind[&ErrorKind::Network], 2);
        assert_eq!(metrics.errors_by_kind[&ErrorKind::Server], 1);
    }

    #[test]
    fn test_empty_metrics() {
        let metrics = RunMetrics::new();
        assert_eq!(metrics.average_response_time(), 0.0);
        assert_eq!(metrics.min_response_time(), 0.0);
        assert_eq!(metrics.max_response_time(), 0.0);
        assert_eq!(metrics.percentile_response_time(99), 0.0);
        assert_eq!(metrics.error_rate(), 0.0);
        assert_eq!(metrics.throughput(0.0), 0.0);
    }

    #[test]
    fn test_percentiles_and_throughput() {
        let mut metrics = RunMetrics::new();
        for ms in 1..=100 {
            metrics.record(&failure(FaultKind::BadResponse, ms as f64));
        }
        assert_eq!(metrics.percentile_response_time(50), 51.0);
        assert_eq!(metrics.percentile_response_time(99), 100.0);
        assert_eq!(metrics.throughput(2000.0), 50.0);
    }
}
