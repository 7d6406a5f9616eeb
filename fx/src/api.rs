//! Entry points called by the dashboard.
//!
//! These never panic outward: any unexpected failure inside the pipeline is
//! reported as a `system`/`critical` outcome.

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use futures::FutureExt;
use fxguard_common::{elapsed_ms, RawValue};
use once_cell::sync::Lazy;
use tracing::{error, warn};

use crate::conversion::ConversionOutcome;
use crate::engine::{ConversionEngine, EngineConfig};
use crate::error::FxError;
use crate::validation::{InputValidator, ValidationFailure, ValidationOutcome};

static DEFAULT_ENGINE: Lazy<Arc<ConversionEngine>> = Lazy::new(|| {
    let config = EngineConfig::from_env();
    let config = match config.validate() {
        Ok(()) => config,
        Err(e) => {
            warn!(error = %e, "Invalid engine configuration in environment, using defaults");
            EngineConfig::default()
        }
    };
    Arc::new(ConversionEngine::new(config))
});

/// Shared engine configured from the environment.
pub fn default_engine() -> Arc<ConversionEngine> {
    Arc::clone(&DEFAULT_ENGINE)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

/// Validate a raw `(amount, from, to)` triple with the shared engine's bounds.
pub fn validate_currency_input(
    amount: impl Into<RawValue>,
    from_currency: impl Into<RawValue>,
    to_currency: impl Into<RawValue>,
) -> ValidationOutcome {
    let engine = default_engine();
    validate_with(
        engine.validator(),
        &amount.into(),
        &from_currency.into(),
        &to_currency.into(),
    )
}

/// Validate with a specific validator, trapping panics.
pub fn validate_with(
    validator: &InputValidator,
    amount: &RawValue,
    from: &RawValue,
    to: &RawValue,
) -> ValidationOutcome {
    contain_validation_panic(|| validator.validate(amount, from, to))
}

/// Run a validation step, turning a panic into a `system` failure.
fn contain_validation_panic(step: impl FnOnce() -> ValidationOutcome) -> ValidationOutcome {
    catch_unwind(AssertUnwindSafe(step)).unwrap_or_else(|payload| {
        let message = panic_message(payload.as_ref());
        error!(panic = %message, "Validator panicked");
        Err(ValidationFailure::system(message))
    })
}

/// Convert using the shared engine.
pub async fn convert_currency(
    amount: impl Into<RawValue>,
    from_currency: impl Into<RawValue>,
    to_currency: impl Into<RawValue>,
) -> ConversionOutcome {
    convert_with(
        &default_engine(),
        &amount.into(),
        &from_currency.into(),
        &to_currency.into(),
    )
    .await
}

/// Convert with a specific engine, trapping panics.
pub async fn convert_with(
    engine: &ConversionEngine,
    amount: &RawValue,
    from: &RawValue,
    to: &RawValue,
) -> ConversionOutcome {
    let start = engine.clock().now();
    match AssertUnwindSafe(engine.convert(amount, from, to))
        .catch_unwind()
        .await
    {
        Ok(outcome) => outcome,
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            error!(panic = %message, "Conversion panicked");
            ConversionOutcome::from_result(
                Err(FxError::Internal(message)),
                elapsed_ms(start, engine.clock().now()),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::RandomSource;
    use fxguard_common::{ErrorKind, ManualClock, Severity};
    use rust_decimal_macros::dec;

    struct PanickingRandom;

    impl RandomSource for PanickingRandom {
        fn next_f64(&self) -> f64 {
            panic!("entropy exhausted")
        }
    }

    #[test]
    fn test_validate_currency_input() {
        let input = validate_currency_input(100, "USD", "EUR").unwrap();
        assert_eq!(input.sanitized_amount, 100.0);

        let failure = validate_currency_input(100, "usd", "EUR").unwrap_err();
        assert_eq!(failure.kind, ErrorKind::Format);

        let failure = validate_currency_input(RawValue::Missing, "USD", "EUR").unwrap_err();
        assert_eq!(failure.kind, ErrorKind::Type);
    }

    #[test]
    fn test_validation_panic_becomes_system_failure() {
        let failure = contain_validation_panic(|| panic!("lookup table corrupted")).unwrap_err();

        assert_eq!(failure.kind, ErrorKind::System);
        assert_eq!(failure.severity, Severity::Critical);
        assert_eq!(failure.details.as_deref(), Some("lookup table corrupted"));
    }

    #[test]
    fn test_validation_without_panic_passes_through() {
        let validator = InputValidator::default();
        let outcome = contain_validation_panic(|| {
            validator.validate(&50.into(), &"GBP".into(), &"JPY".into())
        });
        assert_eq!(outcome.unwrap().sanitized_amount, 50.0);
    }

    #[test]
    fn test_validate_currency_input_uses_shared_engine_bounds() {
        let engine = default_engine();
        let bounds = engine.validator().config();
        let over = validate_currency_input(bounds.max_amount * 2.0, "USD", "EUR").unwrap_err();
        assert_eq!(over.kind, ErrorKind::Range);

        let expected = validate_with(
            engine.validator(),
            &(bounds.max_amount * 2.0).into(),
            &"USD".into(),
            &"EUR".into(),
        );
        assert_eq!(Err(over), expected);
    }

    #[test]
    fn test_validate_from_json_payload() {
        let payload = serde_json::json!({ "amount": "250.75", "from": "GBP", "to": true });
        let failure = validate_currency_input(
            payload["amount"].clone(),
            payload["from"].clone(),
            payload["to"].clone(),
        )
        .unwrap_err();
        assert_eq!(failure.kind, ErrorKind::Type);
        assert!(failure.message.contains("toCurrency"));
    }

    #[tokio::test]
    async fn test_convert_with_instant_engine() {
        let engine = ConversionEngine::builder()
            .config(EngineConfig::instant())
            .clock(Arc::new(ManualClock::at_epoch()))
            .build();

        let outcome = convert_with(&engine, &100.into(), &"USD".into(), &"EUR".into()).await;
        assert_eq!(outcome.result(), Some(dec!(85.24)));
    }

    #[tokio::test]
    async fn test_panic_becomes_system_failure() {
        let engine = ConversionEngine::builder()
            .clock(Arc::new(ManualClock::at_epoch()))
            .random(Arc::new(PanickingRandom))
            .build();

        let outcome = convert_with(&engine, &100.into(), &"USD".into(), &"EUR".into()).await;

        assert!(!outcome.is_success());
        assert_eq!(outcome.error_type(), Some(ErrorKind::System));
        assert_eq!(outcome.severity(), Some(Severity::Critical));
        assert!(outcome.error().unwrap().contains("entropy exhausted"));
    }

    #[tokio::test]
    async fn test_convert_currency_rejects_before_delay() {
        let outcome = convert_currency(-5, "USD", "EUR").await;
        assert_eq!(outcome.error_type(), Some(ErrorKind::Range));
    }
}
