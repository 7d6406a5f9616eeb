//! Conversion engine: validation, simulated transport, rate lookup and rounding.

use std::sync::Arc;
use std::time::Duration;

use fxguard_common::time::constants::{SIMULATED_LATENCY_MAX, SIMULATED_LATENCY_MIN};
use fxguard_common::{elapsed_ms, Clock, RawValue, SystemClock};
use rust_decimal::Decimal;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::conversion::{Conversion, ConversionOutcome};
use crate::error::{FxError, FxResult};
use crate::fault::FaultConfig;
use crate::precision::{resolve_precision, round_to_precision};
use crate::random::{RandomSource, StdRandomSource};
use crate::rates::RateTable;
use crate::validation::{InputValidator, ValidationConfig};

/// Configuration for the conversion engine.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Amount bounds.
    pub validation: ValidationConfig,
    /// Lower bound of the simulated transport delay.
    pub latency_min: Duration,
    /// Upper bound of the simulated transport delay.
    pub latency_max: Duration,
    /// Fault injection settings.
    pub faults: FaultConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            validation: ValidationConfig::default(),
            latency_min: SIMULATED_LATENCY_MIN,
            latency_max: SIMULATED_LATENCY_MAX,
            faults: FaultConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables.
    ///
    /// Unset or unparsable variables keep their defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(ms) = env_parse::<u64>("FXGUARD_LATENCY_MIN_MS") {
            config.latency_min = Duration::from_millis(ms);
        }
        if let Some(ms) = env_parse::<u64>("FXGUARD_LATENCY_MAX_MS") {
            config.latency_max = Duration::from_millis(ms);
        }
        if let Some(p) = env_parse::<f64>("FXGUARD_FAULT_PROBABILITY") {
            config.faults.probability = p;
        }
        if let Some(min) = env_parse::<f64>("FXGUARD_MIN_AMOUNT") {
            config.validation.min_amount = min;
        }
        if let Some(max) = env_parse::<f64>("FXGUARD_MAX_AMOUNT") {
            config.validation.max_amount = max;
        }

        config
    }

    /// Configuration with no delay and no fault injection.
    pub fn instant() -> Self {
        Self {
            latency_min: Duration::ZERO,
            latency_max: Duration::ZERO,
            faults: FaultConfig::disabled(),
            ..Self::default()
        }
    }

    /// Validate configuration.
    pub fn validate(&self) -> FxResult<()> {
        if self.latency_min > self.latency_max {
            return Err(FxError::Configuration(
                "Minimum latency cannot exceed maximum latency".to_string(),
            ));
        }

        let p = self.faults.probability;
        if !(0.0..=1.0).contains(&p) {
            return Err(FxError::Configuration(format!(
                "Fault probability must be within [0, 1], got {p}"
            )));
        }

        let ValidationConfig {
            min_amount,
            max_amount,
        } = self.validation;
        if !(min_amount.is_finite() && min_amount > 0.0) {
            return Err(FxError::Configuration(
                "Minimum amount must be a positive finite number".to_string(),
            ));
        }
        if !(max_amount.is_finite() && min_amount < max_amount) {
            return Err(FxError::Configuration(
                "Maximum amount must be finite and above the minimum".to_string(),
            ));
        }

        Ok(())
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok()?.trim().parse().ok()
}

/// The conversion engine.
pub struct ConversionEngine {
    validator: InputValidator,
    rates: Arc<RateTable>,
    clock: Arc<dyn Clock>,
    random: Arc<dyn RandomSource>,
    config: EngineConfig,
}

impl ConversionEngine {
    /// Engine over the standard rate table, wall clock and entropy RNG.
    pub fn new(config: EngineConfig) -> Self {
        Self::builder().config(config).build()
    }

    pub fn builder() -> ConversionEngineBuilder {
        ConversionEngineBuilder::default()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn validator(&self) -> &InputValidator {
        &self.validator
    }

    pub fn rates(&self) -> &Arc<RateTable> {
        &self.rates
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Convert, returning a structured outcome with the measured time.
    pub async fn convert(&self, amount: &RawValue, from: &RawValue, to: &RawValue) -> ConversionOutcome {
        let start = self.clock.now();
        let result = self.try_convert(amount, from, to).await;
        let response_time_ms = elapsed_ms(start, self.clock.now());

        if let Err(err) = &result {
            debug!(
                error_type = %err.error_kind(),
                severity = %err.severity(),
                response_time_ms,
                "Conversion rejected"
            );
        }

        ConversionOutcome::from_result(result, response_time_ms)
    }

    /// Convert, propagating failures as [`FxError`].
    #[instrument(skip(self, amount, from, to), fields(amount = %amount, from = %from, to = %to))]
    pub async fn try_convert(&self, amount: &RawValue, from: &RawValue, to: &RawValue) -> FxResult<Conversion> {
        let input = self.validator.validate(amount, from, to)?;

        self.clock.sleep(self.simulated_latency()).await;

        if let Some(fault) = self.config.faults.roll(self.random.as_ref()) {
            warn!(fault = ?fault, "Injected transport fault");
            return Err(FxError::Fault(fault));
        }

        let pair = input.pair();
        let lookup = self.rates.lookup_pair(&pair);
        if lookup.is_fallback() {
            warn!(pair = %pair, "No rate for pair, using neutral rate");
        }

        let amount = to_decimal(input.sanitized_amount)?;
        let raw = amount
            .checked_mul(lookup.rate)
            .ok_or_else(|| FxError::Overflow {
                amount: amount.to_string(),
                rate: lookup.rate.to_string(),
            })?;

        let precision = resolve_precision(input.sanitized_amount, pair.base.code(), pair.quote.code());
        let result = round_to_precision(raw, precision);

        let conversion = Conversion {
            id: Uuid::now_v7(),
            amount: input.sanitized_amount,
            result,
            rate: lookup.rate,
            rate_source: lookup.source,
            precision,
            pair,
            executed_at: self.clock.now(),
        };

        debug!(
            conversion_id = %conversion.id,
            result = %conversion.result,
            precision,
            "Conversion completed"
        );

        Ok(conversion)
    }

    /// Draw a delay from `[latency_min, latency_max)`.
    fn simulated_latency(&self) -> Duration {
        let lo = self.config.latency_min.as_secs_f64() * 1_000_000.0;
        let hi = self.config.latency_max.as_secs_f64() * 1_000_000.0;
        if hi <= lo {
            return self.config.latency_min;
        }
        let micros = self.random.uniform(lo, hi).floor().min(hi - 1.0);
        Duration::from_micros(micros as u64)
    }
}

/// Carry an amount into decimal arithmetic through its shortest round-trip text.
fn to_decimal(amount: f64) -> FxResult<Decimal> {
    amount
        .to_string()
        .parse::<Decimal>()
        .map_err(|_| FxError::UnrepresentableAmount(amount))
}

/// Builder for [`ConversionEngine`] with injectable collaborators.
#[derive(Default)]
pub struct ConversionEngineBuilder {
    config: EngineConfig,
    rates: Option<Arc<RateTable>>,
    clock: Option<Arc<dyn Clock>>,
    random: Option<Arc<dyn RandomSource>>,
}

impl ConversionEngineBuilder {
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn rate_table(mut self, rates: Arc<RateTable>) -> Self {
        self.rates = Some(rates);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn random(mut self, random: Arc<dyn RandomSource>) -> Self {
        self.random = Some(random);
        self
    }

    pub fn build(self) -> ConversionEngine {
        ConversionEngine {
            validator: InputValidator::new(self.config.validation),
            rates: self.rates.unwrap_or_else(RateTable::standard),
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            random: self
                .random
                .unwrap_or_else(|| Arc::new(StdRandomSource::from_entropy())),
            config: self.config,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fault::FaultKind;
    use crate::random::SequenceRandomSource;
    use crate::rates::RateSource;
    use fxguard_common::{ErrorKind, ManualClock, Severity};
    use rust_decimal_macros::dec;

    /// Engine on a virtual clock with scripted random draws.
    fn setup_engine(draws: Vec<f64>) -> (ConversionEngine, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::at_epoch());
        let engine = ConversionEngine::builder()
            .clock(clock.clone())
            .random(Arc::new(SequenceRandomSource::new(draws)))
            .build();
        (engine, clock)
    }

    async fn convert(engine: &ConversionEngine, amount: f64, from: &str, to: &str) -> ConversionOutcome {
        engine.convert(&amount.into(), &from.into(), &to.into()).await
    }

    #[tokio::test]
    async fn test_usd_to_eur() {
        let (engine, _) = setup_engine(vec![0.5]);

        let outcome = convert(&engine, 100.0, "USD", "EUR").await;

        assert!(outcome.is_success());
        assert_eq!(outcome.result(), Some(dec!(85.24)));
        let metadata = outcome.metadata().unwrap();
        assert_eq!(metadata.rate, dec!(0.85235));
        assert_eq!(metadata.precision, 2);
        assert_eq!(metadata.from_currency, "USD");
        assert_eq!(metadata.to_currency, "EUR");
        assert_eq!(outcome.response_time_ms(), 100.0);
    }

    #[tokio::test]
    async fn test_small_amount_to_jpy() {
        let (engine, _) = setup_engine(vec![0.5]);

        let outcome = convert(&engine, 0.001, "USD", "JPY").await;

        let metadata = outcome.metadata().unwrap();
        assert_eq!(metadata.precision, 6);
        assert_eq!(metadata.rate, dec!(110.25));
        assert_eq!(outcome.result(), Some(dec!(0.11025)));
    }

    #[tokio::test]
    async fn test_negative_amount_fails_fast() {
        let (engine, _) = setup_engine(vec![0.5]);

        let outcome = convert(&engine, -5.0, "USD", "EUR").await;

        assert!(!outcome.is_success());
        assert_eq!(outcome.error_type(), Some(ErrorKind::Range));
        // Validation failures return before the simulated delay.
        assert_eq!(outcome.response_time_ms(), 0.0);
    }

    #[tokio::test]
    async fn test_delay_bounds() {
        let (engine, clock) = setup_engine(vec![0.0]);
        let start = clock.now();
        convert(&engine, 10.0, "USD", "EUR").await;
        assert_eq!(elapsed_ms(start, clock.now()), 50.0);

        let (engine, _) = setup_engine(vec![0.999_99]);
        let outcome = convert(&engine, 10.0, "USD", "EUR").await;
        assert!(outcome.response_time_ms() >= 149.0 && outcome.response_time_ms() < 150.0);
    }

    #[test]
    fn test_delay_excludes_upper_bound() {
        for draw in [0.999_999_999, 1.0] {
            let (engine, _) = setup_engine(vec![draw]);
            let delay = engine.simulated_latency();
            assert!(delay < Duration::from_millis(150), "{delay:?} for draw {draw}");
            assert!(delay >= Duration::from_micros(149_999));
        }
    }

    #[tokio::test]
    async fn test_fault_path() {
        // delay draw, gate draw (< 0.001), kind draw (index 2)
        let (engine, _) = setup_engine(vec![0.5, 0.0, 0.5]);

        let outcome = convert(&engine, 100.0, "USD", "EUR").await;

        assert_eq!(outcome.error_type(), Some(ErrorKind::RateLimit));
        assert_eq!(outcome.severity(), Some(Severity::Medium));
        assert_eq!(outcome.error(), Some(FaultKind::RateLimited.message()));
        assert_eq!(outcome.response_time_ms(), 100.0);
    }

    #[tokio::test]
    async fn test_each_fault_kind_reachable() {
        for (index, kind) in FaultKind::ALL.iter().enumerate() {
            let pick = (index as f64 + 0.5) / FaultKind::ALL.len() as f64;
            let (engine, _) = setup_engine(vec![0.5, 0.0, pick]);
            let err = engine
                .try_convert(&100.0.into(), &"USD".into(), &"EUR".into())
                .await
                .unwrap_err();
            assert!(matches!(err, FxError::Fault(k) if k == *kind));
        }
    }

    #[tokio::test]
    async fn test_missing_pair_uses_neutral_rate() {
        let clock = Arc::new(ManualClock::at_epoch());
        let table = Arc::new(RateTable::builder().rate("USD", "EUR", dec!(0.9)).build());
        let engine = ConversionEngine::builder()
            .config(EngineConfig::instant())
            .rate_table(table)
            .clock(clock)
            .build();

        let conversion = engine
            .try_convert(&50.0.into(), &"GBP".into(), &"CHF".into())
            .await
            .unwrap();
        assert_eq!(conversion.rate, Decimal::ONE);
        assert_eq!(conversion.rate_source, RateSource::Fallback);
        assert_eq!(conversion.result, dec!(50));

        let parity = engine
            .try_convert(&50.0.into(), &"EUR".into(), &"EUR".into())
            .await
            .unwrap();
        assert_eq!(parity.rate, Decimal::ONE);
        assert_eq!(parity.rate_source, RateSource::Parity);
    }

    #[tokio::test]
    async fn test_numeric_string_amount() {
        let (engine, _) = setup_engine(vec![0.5]);
        let outcome = engine
            .convert(&"100".into(), &"USD".into(), &"EUR".into())
            .await;
        assert_eq!(outcome.result(), Some(dec!(85.24)));
    }

    #[tokio::test]
    async fn test_metadata_timestamp_from_clock() {
        let (engine, clock) = setup_engine(vec![0.5]);
        let outcome = convert(&engine, 1.0, "USD", "GBP").await;
        assert_eq!(outcome.metadata().unwrap().timestamp, clock.now());
    }

    #[test]
    fn test_to_decimal() {
        assert_eq!(to_decimal(100.0).unwrap(), dec!(100));
        assert_eq!(to_decimal(0.000001).unwrap(), dec!(0.000001));
        assert_eq!(to_decimal(9_007_199_254_740_991.0).unwrap(), dec!(9007199254740991));
        assert!(matches!(to_decimal(1e300), Err(FxError::UnrepresentableAmount(_))));
    }

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.latency_min, Duration::from_millis(50));
        assert_eq!(config.latency_max, Duration::from_millis(150));
        assert_eq!(config.faults.probability, 0.001);
    }

    #[test]
    fn test_invalid_config() {
        let mut config = EngineConfig::default();
        config.latency_min = Duration::from_millis(200);
        assert!(config.validate().is_err());

        let mut config = EngineConfig::default();
        config.faults.probability = 1.5;
        assert!(config.validate().is_err());

        let mut config = EngineConfig::default();
        config.validation.min_amount = 0.0;
        assert!(matches!(config.validate(), Err(FxError::Configuration(_))));
    }
}
