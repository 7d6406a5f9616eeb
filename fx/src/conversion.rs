//! Conversion records and the caller-facing outcome.

use fxguard_common::{CurrencyPair, ErrorKind, Severity, Timestamp};
use rust_decimal::Decimal;
use serde::{Serialize, Serializer};
use uuid::Uuid;

use crate::error::FxError;
use crate::rates::RateSource;

/// A completed conversion.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversion {
    /// Unique conversion ID.
    pub id: Uuid,
    /// Sanitized input amount.
    pub amount: f64,
    /// Rounded converted amount.
    #[serde(with = "rust_decimal::serde::float")]
    pub result: Decimal,
    /// Rate applied.
    #[serde(with = "rust_decimal::serde::float")]
    pub rate: Decimal,
    /// How the rate was resolved.
    pub rate_source: RateSource,
    /// Decimal places the result was rounded to.
    pub precision: u32,
    pub pair: CurrencyPair,
    pub executed_at: Timestamp,
}

impl Conversion {
    /// Metadata block attached to a successful outcome.
    pub fn metadata(&self) -> ConversionMetadata {
        ConversionMetadata {
            rate: self.rate,
            precision: self.precision,
            timestamp: self.executed_at,
            from_currency: self.pair.base.code().to_string(),
            to_currency: self.pair.quote.code().to_string(),
            rate_source: self.rate_source,
        }
    }
}

/// Details of how a result was produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionMetadata {
    #[serde(with = "rust_decimal::serde::float")]
    pub rate: Decimal,
    pub precision: u32,
    /// Serialized as Unix milliseconds.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: Timestamp,
    pub from_currency: String,
    pub to_currency: String,
    pub rate_source: RateSource,
}

/// Why a conversion did not produce a result.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionFailure {
    pub error: String,
    pub error_type: ErrorKind,
    pub severity: Severity,
    pub details: Option<String>,
}

impl From<&FxError> for ConversionFailure {
    fn from(err: &FxError) -> Self {
        Self {
            error: err.message(),
            error_type: err.error_kind(),
            severity: err.severity(),
            details: err.details(),
        }
    }
}

/// Result of one conversion request, always carrying the measured time.
#[derive(Debug, Clone, PartialEq)]
pub enum ConversionOutcome {
    Success {
        conversion: Conversion,
        response_time_ms: f64,
    },
    Failure {
        failure: ConversionFailure,
        response_time_ms: f64,
    },
}

impl ConversionOutcome {
    pub fn from_result(result: Result<Conversion, FxError>, response_time_ms: f64) -> Self {
        match result {
            Ok(conversion) => ConversionOutcome::Success {
                conversion,
                response_time_ms,
            },
            Err(err) => ConversionOutcome::Failure {
                failure: ConversionFailure::from(&err),
                response_time_ms,
            },
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ConversionOutcome::Success { .. })
    }

    pub fn response_time_ms(&self) -> f64 {
        match self {
            ConversionOutcome::Success {
                response_time_ms, ..
            }
            | ConversionOutcome::Failure {
                response_time_ms, ..
            } => *response_time_ms,
        }
    }

    pub fn conversion(&self) -> Option<&Conversion> {
        match self {
            ConversionOutcome::Success { conversion, .. } => Some(conversion),
            ConversionOutcome::Failure { .. } => None,
        }
    }

    pub fn result(&self) -> Option<Decimal> {
        self.conversion().map(|c| c.result)
    }

    pub fn metadata(&self) -> Option<ConversionMetadata> {
        self.conversion().map(Conversion::metadata)
    }

    pub fn failure(&self) -> Option<&ConversionFailure> {
        match self {
            ConversionOutcome::Failure { failure, .. } => Some(failure),
            ConversionOutcome::Success { .. } => None,
        }
    }

    pub fn error_type(&self) -> Option<ErrorKind> {
        self.failure().map(|f| f.error_type)
    }

    pub fn severity(&self) -> Option<Severity> {
        self.failure().map(|f| f.severity)
    }

    pub fn error(&self) -> Option<&str> {
        self.failure().map(|f| f.error.as_str())
    }
}

/// Flat shape consumed by the dashboard.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WireOutcome<'a> {
    success: bool,
    #[serde(
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    result: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_type: Option<ErrorKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    severity: Option<Severity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<&'a str>,
    response_time: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    metadata: Option<ConversionMetadata>,
}

impl Serialize for ConversionOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let failure = self.failure();
        WireOutcome {
            success: self.is_success(),
            result: self.result(),
            error: failure.map(|f| f.error.as_str()),
            error_type: failure.map(|f| f.error_type),
            severity: failure.map(|f| f.severity),
            details: failure.and_then(|f| f.details.as_deref()),
            response_time: self.response_time_ms(),
            metadata: self.metadata(),
        }
        .serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fault::FaultKind;
    use chrono::{TimeZone, Utc};
    use fxguard_common::Currency;
    use rust_decimal_macros::dec;

    fn sample_conversion() -> Conversion {
        Conversion {
            id: Uuid::now_v7(),
            amount: 100.0,
            result: dec!(85.24),
            rate: dec!(0.85235),
            rate_source: RateSource::Table,
            precision: 2,
            pair: CurrencyPair::new(Currency::usd(), Currency::eur()),
            executed_at: Utc.timestamp_millis_opt(1_700_000_000_000).unwrap(),
        }
    }

    #[test]
    fn test_success_wire_shape() {
        let outcome = ConversionOutcome::Success {
            conversion: sample_conversion(),
            response_time_ms: 101.5,
        };
        let json = serde_json::to_value(&outcome).unwrap();

        assert_eq!(json["success"], true);
        assert_eq!(json["result"], 85.24);
        assert_eq!(json["responseTime"], 101.5);
        assert_eq!(json["metadata"]["rate"], 0.85235);
        assert_eq!(json["metadata"]["precision"], 2);
        assert_eq!(json["metadata"]["timestamp"], 1_700_000_000_000i64);
        assert_eq!(json["metadata"]["fromCurrency"], "USD");
        assert_eq!(json["metadata"]["toCurrency"], "EUR");
        assert!(json.get("error").is_none());
        assert!(json.get("errorType").is_none());
    }

    #[test]
    fn test_failure_wire_shape() {
        let outcome = ConversionOutcome::from_result(Err(FxError::Fault(FaultKind::ServerError)), 75.0);
        let json = serde_json::to_value(&outcome).unwrap();

        assert_eq!(json["success"], false);
        assert_eq!(json["errorType"], "server");
        assert_eq!(json["severity"], "high");
        assert_eq!(json["responseTime"], 75.0);
        assert!(json.get("result").is_none());
        assert!(json.get("metadata").is_none());
    }

    #[test]
    fn test_accessors_agree_with_variant() {
        let ok = ConversionOutcome::from_result(Ok(sample_conversion()), 1.0);
        assert!(ok.is_success());
        assert!(ok.result().is_some() && ok.metadata().is_some() && ok.error().is_none());

        let err = ConversionOutcome::from_result(Err(FxError::Internal("x".into())), 1.0);
        assert!(!err.is_success());
        assert!(err.result().is_none() && err.metadata().is_none() && err.error().is_some());
        assert_eq!(err.error_type(), Some(ErrorKind::System));
        assert_eq!(err.severity(), Some(Severity::Critical));
    }
}
