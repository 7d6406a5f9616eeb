//! Magnitude- and currency-aware result precision.

use fxguard_common::Currency;
use rust_decimal::{Decimal, RoundingStrategy};

/// Highest precision ever returned.
pub const MAX_PRECISION: u32 = 8;

/// Digits removed when a zero-decimal currency is involved.
const ZERO_DECIMAL_ADJUSTMENT: u32 = 2;

/// Base precision for an input amount, before currency adjustment.
///
/// | amount        | places |
/// |---------------|--------|
/// | < 0.01        | 8      |
/// | < 1           | 6      |
/// | < 100         | 4      |
/// | otherwise     | 2      |
fn base_precision(amount: f64) -> u32 {
    if amount < 0.01 {
        8
    } else if amount < 1.0 {
        6
    } else if amount < 100.0 {
        4
    } else {
        2
    }
}

fn is_zero_decimal(code: &str) -> bool {
    Currency::parse_normalized(code).is_some_and(|c| c.is_zero_decimal())
}

/// Decimal places to round a conversion of `amount` from `from` to `to`.
///
/// The band is chosen on the pre-conversion amount. When either side is a
/// zero-decimal currency the band is reduced by two, floored at zero.
pub fn resolve_precision(amount: f64, from: &str, to: &str) -> u32 {
    let base = base_precision(amount);
    let precision = if is_zero_decimal(from) || is_zero_decimal(to) {
        base.saturating_sub(ZERO_DECIMAL_ADJUSTMENT)
    } else {
        base
    };
    precision.min(MAX_PRECISION)
}

/// Round half away from zero to `precision` places.
pub fn round_to_precision(value: Decimal, precision: u32) -> Decimal {
    value.round_dp_with_strategy(precision, RoundingStrategy::MidpointAwayFromZero)
}
