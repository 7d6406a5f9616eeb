//! FxGuard Conversion Engine
//!
//! Validation, precision resolution and simulated conversion of currency
//! amounts.
//!
//! # Features
//!
//! - Layered input validation with a security scan of currency fields
//! - Static rate table with explicit fallback reporting
//! - Magnitude- and currency-aware rounding precision
//! - Simulated transport latency and fault injection behind injectable
//!   clock and randomness
//!
//! # Example
//!
//! ```rust,ignore
//! use fxguard_fx::{convert_currency, validate_currency_input};
//!
//! let input = validate_currency_input(100, "USD", "EUR")?;
//!
//! let outcome = convert_currency(100, "USD", "EUR").await;
//! assert_eq!(outcome.result(), Some(dec!(85.24)));
//! ```

pub mod api;
pub mod conversion;
pub mod engine;
pub mod error;
pub mod fault;
pub mod precision;
pub mod random;
pub mod rates;
pub mod validation;

pub use api::{convert_currency, convert_with, default_engine, validate_currency_input, validate_with};
pub use conversion::{Conversion, ConversionFailure, ConversionMetadata, ConversionOutcome};
pub use engine::{ConversionEngine, ConversionEngineBuilder, EngineConfig};
pub use error::{FxError, FxResult};
pub use fault::{FaultConfig, FaultKind};
pub use precision::{resolve_precision, round_to_precision};
pub use random::{RandomSource, SequenceRandomSource, StdRandomSource};
pub use rates::{RateLookup, RateSource, RateTable};
pub use validation::{InputValidator, ValidatedInput, ValidationConfig, ValidationFailure, ValidationOutcome};
