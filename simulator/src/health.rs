//! Simulated system health snapshot for dashboard widgets.

use fxguard_common::{Clock, Timestamp};
use fxguard_fx::RandomSource;
use serde::Serialize;

/// One randomly generated health reading.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemHealthMetrics {
    /// Percent.
    pub memory_usage: f64,
    /// Percent.
    pub cpu_usage: f64,
    /// Milliseconds.
    pub response_time: f64,
    /// Percent.
    pub error_rate: f64,
    /// Requests per second.
    pub throughput: f64,
    /// Milliseconds.
    pub network_latency: f64,
    /// Percent.
    pub disk_usage: f64,
    /// Percent.
    pub cache_hit_rate: f64,
    pub gc_collections: u32,
    pub thread_count: u32,
    pub connection_pool_size: u32,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: Timestamp,
}

/// Fixed sampling bands, `[lo, hi)`.
pub mod bands {
    pub const MEMORY_USAGE: (f64, f64) = (40.0, 80.0);
    pub const CPU_USAGE: (f64, f64) = (15.0, 75.0);
    pub const RESPONSE_TIME: (f64, f64) = (50.0, 200.0);
    pub const ERROR_RATE: (f64, f64) = (0.0, 2.0);
    pub const THROUGHPUT: (f64, f64) = (800.0, 1200.0);
    pub const NETWORK_LATENCY: (f64, f64) = (10.0, 60.0);
    pub const DISK_USAGE: (f64, f64) = (30.0, 70.0);
    pub const CACHE_HIT_RATE: (f64, f64) = (85.0, 99.0);
    pub const GC_COLLECTIONS: (u32, u32) = (0, 10);
    pub const THREAD_COUNT: (u32, u32) = (8, 33);
    pub const CONNECTION_POOL_SIZE: (u32, u32) = (10, 51);
}

fn sample(random: &dyn RandomSource, (lo, hi): (f64, f64)) -> f64 {
    (random.uniform(lo, hi) * 100.0).round() / 100.0
}

fn sample_count(random: &dyn RandomSource, (lo, hi): (u32, u32)) -> u32 {
    lo + random.pick_index((hi - lo) as usize) as u32
}

/// Produce a health snapshot. Values carry no real measurement.
pub fn get_system_health_metrics(random: &dyn RandomSource, clock: &dyn Clock) -> SystemHealthMetrics {
    SystemHealthMetrics {
        memory_usage: sample(random, bands::MEMORY_USAGE),
        cpu_usage: sample(random, bands::CPU_USAGE),
        response_time: sample(random, bands::RESPONSE_TIME),
        error_rate: sample(random, bands::ERROR_RATE),
        throughput: sample(random, bands::THROUGHPUT),
        network_latency: sample(random, bands::NETWORK_LATENCY),
        disk_usage: sample(random, bands::DISK_USAGE),
        cache_hit_rate: sample(random, bands::CACHE_HIT_RATE),
        gc_collections: sample_count(random, bands::GC_COLLECTIONS),
        thread_count: sample_count(random, bands::THREAD_COUNT),
        connection_pool_size: sample_count(random, bands::CONNECTION_POOL_SIZE),
        timestamp: clock.now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fxguard_common::ManualClock;
    use fxguard_fx::{SequenceRandomSource, StdRandomSource};
    use proptest::prelude::*;

    fn within(value: f64, (lo, hi): (f64, f64)) -> bool {
        value >= lo && value <= hi
    }

    #[test]
    fn test_lower_edge() {
        let clock = ManualClock::at_epoch();
        let metrics = get_system_health_metrics(&SequenceRandomSource::constant(0.0), &clock);

        assert_eq!(metrics.memory_usage, 40.0);
        assert_eq!(metrics.gc_collections, 0);
        assert_eq!(metrics.thread_count, 8);
        assert_eq!(metrics.connection_pool_size, 10);
        assert_eq!(metrics.timestamp, clock.now());
    }

    #[test]
    fn test_wire_names() {
        let metrics =
            get_system_health_metrics(&SequenceRandomSource::constant(0.5), &ManualClock::at_epoch());
        let json = serde_json::to_value(&metrics).unwrap();
        for key in [
            "memoryUsage",
            "cpuUsage",
            "responseTime",
            "errorRate",
            "throughput",
            "networkLatency",
            "diskUsage",
            "cacheHitRate",
            "gcCollections",
            "threadCount",
            "connectionPoolSize",
            "timestamp",
        ] {
            assert!(json.get(key).is_some(), "missing {key}");
        }
    }

    proptest! {
        #[test]
        fn prop_values_stay_in_bands(seed in any::<u64>()) {
            let random = StdRandomSource::seeded(seed);
            let m = get_system_health_metrics(&random, &ManualClock::at_epoch());

            prop_assert!(within(m.memory_usage, bands::MEMORY_USAGE));
            prop_assert!(within(m.cpu_usage, bands::CPU_USAGE));
            prop_assert!(within(m.response_time, bands::RESPONSE_TIME));
            prop_assert!(within(m.error_rate, bands::ERROR_RATE));
            prop_assert!(within(m.throughput, bands::THROUGHPUT));
            prop_assert!(within(m.network_latency, bands::NETWORK_LATENCY));
            prop_assert!(within(m.disk_usage, bands::DISK_USAGE));
            prop_assert!(within(m.cache_hit_rate, bands::CACHE_HIT_RATE));
            prop_assert!(m.gc_collections < 10);
            prop_assert!((8..33).contains(&m.thread_count));
            prop_assert!((10..51).contains(&m.connection_pool_size));
        }
    }
}
