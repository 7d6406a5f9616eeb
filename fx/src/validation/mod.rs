//! Layered validation of raw conversion input.
//!
//! The pipeline short-circuits at the first failure:
//!
//! 1. security scan of any string currency field
//! 2. amount presence and type
//! 3. amount finiteness, positivity and bounds
//! 4. currency types
//! 5. currency format (length, case, shape)
//! 6. currency allow-list

pub mod security;

use fxguard_common::{Currency, CurrencyPair, ErrorKind, RawValue, Severity};
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

pub use security::ThreatCategory;

/// Largest integer an IEEE-754 double represents exactly.
pub const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// Smallest accepted amount.
pub const MIN_AMOUNT: f64 = 0.000_001;

/// Bounds applied to amounts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValidationConfig {
    /// Smallest accepted amount (inclusive).
    pub min_amount: f64,
    /// Largest accepted amount (inclusive).
    pub max_amount: f64,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            min_amount: MIN_AMOUNT,
            max_amount: MAX_SAFE_INTEGER,
        }
    }
}

/// A rejected input, carried as data.
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[serde(rename_all = "camelCase")]
#[error("{kind} error ({severity}): {message}")]
pub struct ValidationFailure {
    pub kind: ErrorKind,
    pub severity: Severity,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ValidationFailure {
    pub fn new(kind: ErrorKind, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            kind,
            severity,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Unexpected internal failure.
    pub fn system(details: impl Into<String>) -> Self {
        Self::new(
            ErrorKind::System,
            Severity::Critical,
            "Unexpected error during validation",
        )
        .with_details(details)
    }
}

/// Input that passed every check.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidatedInput {
    /// Finite, strictly positive and within the configured bounds.
    #[serde(rename = "sanitizedAmount")]
    pub sanitized_amount: f64,
    #[serde(rename = "normalizedFromCurrency")]
    pub from: Currency,
    #[serde(rename = "normalizedToCurrency")]
    pub to: Currency,
}

impl ValidatedInput {
    pub fn pair(&self) -> CurrencyPair {
        CurrencyPair::new(self.from.clone(), self.to.clone())
    }
}

/// Result of validating one raw triple.
pub type ValidationOutcome = Result<ValidatedInput, ValidationFailure>;

/// Which currency parameter a check applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    From,
    To,
}

impl Field {
    fn name(&self) -> &'static str {
        match self {
            Field::From => "fromCurrency",
            Field::To => "toCurrency",
        }
    }
}

/// Validates and normalizes `(amount, from, to)` triples.
#[derive(Debug, Clone, Default)]
pub struct InputValidator {
    config: ValidationConfig,
}

impl InputValidator {
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    /// Run the full pipeline.
    pub fn validate(&self, amount: &RawValue, from: &RawValue, to: &RawValue) -> ValidationOutcome {
        // Hostile strings are rejected before anything else is looked at.
        self.check_security(from, Field::From)?;
        self.check_security(to, Field::To)?;

        let amount = self.check_amount(amount)?;

        let from_code = Self::require_string(from, Field::From)?;
        let to_code = Self::require_string(to, Field::To)?;

        Self::check_format(from_code, Field::From)?;
        Self::check_format(to_code, Field::To)?;

        let from = Self::check_supported(from_code, Field::From)?;
        let to = Self::check_supported(to_code, Field::To)?;

        debug!(amount, from = %from, to = %to, "Input validated");

        Ok(ValidatedInput {
            sanitized_amount: amount,
            from,
            to,
        })
    }

    fn check_amount(&self, raw: &RawValue) -> Result<f64, ValidationFailure> {
        let amount = Self::coerce_amount(raw)?;

        if amount.is_nan() {
            return Err(ValidationFailure::new(
                ErrorKind::Range,
                Severity::High,
                "Amount is not a number (NaN)",
            ));
        }
        if amount == f64::INFINITY {
            return Err(ValidationFailure::new(
                ErrorKind::Range,
                Severity::High,
                "Amount cannot be positive infinity",
            ));
        }
        if amount == f64::NEG_INFINITY {
            return Err(ValidationFailure::new(
                ErrorKind::Range,
                Severity::High,
                "Amount cannot be negative infinity",
            ));
        }
        if amount <= 0.0 {
            return Err(ValidationFailure::new(
                ErrorKind::Range,
                Severity::Medium,
                "Amount must be greater than zero",
            )
            .with_details(format!("received {amount}")));
        }
        if amount < self.config.min_amount {
            return Err(ValidationFailure::new(
                ErrorKind::Range,
                Severity::High,
                format!("Amount is below the minimum of {}", self.config.min_amount),
            )
            .with_details(format!("received {amount}")));
        }
        if amount > self.config.max_amount {
            return Err(ValidationFailure::new(
                ErrorKind::Range,
                Severity::High,
                format!("Amount exceeds the maximum of {}", self.config.max_amount),
            )
            .with_details(format!("received {amount}")));
        }

        Ok(amount)
    }

    fn coerce_amount(raw: &RawValue) -> Result<f64, ValidationFailure> {
        match raw {
            RawValue::Number(n) => Ok(*n),
            RawValue::Text(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return Err(ValidationFailure::new(
                        ErrorKind::Type,
                        Severity::Medium,
                        "Amount must be a valid number",
                    )
                    .with_details("received an empty string"));
                }
                trimmed.parse::<f64>().map_err(|_| {
                    ValidationFailure::new(
                        ErrorKind::Type,
                        Severity::Medium,
                        "Amount must be a valid number",
                    )
                    .with_details(format!("received {s:?}"))
                })
            }
            RawValue::Missing => Err(ValidationFailure::new(
                ErrorKind::Type,
                Severity::High,
                "Amount is required",
            )),
            RawValue::Null => Err(ValidationFailure::new(
                ErrorKind::Type,
                Severity::High,
                "Amount cannot be null",
            )),
            other => Err(ValidationFailure::new(
                ErrorKind::Type,
                Severity::Medium,
                format!("Amount must be a number, received {}", other.type_name()),
            )),
        }
    }

    fn require_string(raw: &RawValue, field: Field) -> Result<&str, ValidationFailure> {
        raw.as_text().ok_or_else(|| {
            ValidationFailure::new(
                ErrorKind::Type,
                Severity::Medium,
                format!("{} must be a string, received {}", field.name(), raw.type_name()),
            )
        })
    }

    fn check_security(&self, raw: &RawValue, field: Field) -> Result<(), ValidationFailure> {
        let Some(text) = raw.as_text() else {
            return Ok(());
        };
        match security::scan(text) {
            Some(category) => Err(ValidationFailure::new(
                ErrorKind::Security,
                Severity::Critical,
                format!(
                    "Potentially malicious input detected in {}: {}",
                    field.name(),
                    category.description()
                ),
            )
            .with_details(format!("category={category} field={}", field.name()))),
            None => Ok(()),
        }
    }

    fn check_format(code: &str, field: Field) -> Result<(), ValidationFailure> {
        if code.chars().count() != 3 {
            return Err(ValidationFailure::new(
                ErrorKind::Format,
                Severity::Medium,
                format!("{} must be exactly 3 characters", field.name()),
            )
            .with_details(format!("received {code:?}")));
        }
        if code != code.to_uppercase() {
            return Err(ValidationFailure::new(
                ErrorKind::Format,
                Severity::Low,
                format!("{} must be uppercase", field.name()),
            )
            .with_details(format!("received {code:?}")));
        }
        if !code.bytes().all(|b| b.is_ascii_uppercase()) {
            return Err(ValidationFailure::new(
                ErrorKind::Format,
                Severity::Medium,
                format!("{} must contain only letters A-Z", field.name()),
            )
            .with_details(format!("received {code:?}")));
        }
        Ok(())
    }

    fn check_supported(code: &str, field: Field) -> Result<Currency, ValidationFailure> {
        Currency::parse_normalized(code).ok_or_else(|| {
            ValidationFailure::new(
                ErrorKind::Format,
                Severity::Medium,
                format!("Unsupported currency: {code}"),
            )
            .with_details(format!("field={}", field.name()))
        })
    }
}
