//! Conversion engine error types.

use fxguard_common::{ErrorKind, Severity};
use thiserror::Error;

use crate::fault::FaultKind;
use crate::validation::ValidationFailure;

/// Errors that can occur in the conversion engine.
#[derive(Debug, Clone, Error)]
pub enum FxError {
    /// Input rejected by the validator.
    #[error(transparent)]
    Validation(#[from] ValidationFailure),

    /// Simulated transport failure.
    #[error("{0}")]
    Fault(FaultKind),

    /// Amount could not be carried into decimal arithmetic.
    #[error("Amount {0} cannot be represented as a decimal")]
    UnrepresentableAmount(f64),

    /// Conversion result overflowed.
    #[error("Conversion of {amount} at rate {rate} overflowed")]
    Overflow { amount: String, rate: String },

    /// Engine configuration is inconsistent.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Unexpected internal failure.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl FxError {
    /// Taxonomy category reported to callers.
    pub fn error_kind(&self) -> ErrorKind {
        match self {
            FxError::Validation(failure) => failure.kind,
            FxError::Fault(kind) => kind.error_kind(),
            FxError::UnrepresentableAmount(_)
            | FxError::Overflow { .. }
            | FxError::Configuration(_)
            | FxError::Internal(_) => ErrorKind::System,
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            FxError::Validation(failure) => failure.severity,
            FxError::Fault(kind) => kind.severity(),
            _ => Severity::Critical,
        }
    }

    /// Caller-facing message.
    pub fn message(&self) -> String {
        match self {
            FxError::Validation(failure) => failure.message.clone(),
            other => other.to_string(),
        }
    }

    /// Supplementary detail, if any.
    pub fn details(&self) -> Option<String> {
        match self {
            FxError::Validation(failure) => failure.details.clone(),
            FxError::Fault(kind) => Some(format!("injected fault: {kind:?}")),
            _ => None,
        }
    }

    /// Check if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        self.error_kind().is_retryable()
    }
}

/// Result type for conversion operations.
pub type FxResult<T> = Result<T, FxError>;
