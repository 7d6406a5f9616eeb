//! Static exchange-rate table.

use std::collections::BTreeMap;
use std::sync::Arc;

use fxguard_common::{Currency, CurrencyPair};
use once_cell::sync::Lazy;
use rust_decimal::Decimal;
use serde::Serialize;

/// Where a looked-up rate came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RateSource {
    /// Explicit entry in the table.
    Table,
    /// Source and target are the same currency.
    Parity,
    /// No entry for the pair; the neutral rate 1 was substituted.
    Fallback,
}

/// Result of a table lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLookup {
    pub rate: Decimal,
    pub source: RateSource,
}

impl RateLookup {
    /// Whether the pair was missing from the table.
    pub fn is_fallback(&self) -> bool {
        self.source == RateSource::Fallback
    }
}

/// Immutable nested mapping `from -> to -> rate`.
#[derive(Debug, Clone, Default)]
pub struct RateTable {
    rates: BTreeMap<String, BTreeMap<String, Decimal>>,
}

static STANDARD: Lazy<Arc<RateTable>> = Lazy::new(|| Arc::new(RateTable::build_standard()));

impl RateTable {
    pub fn builder() -> RateTableBuilder {
        RateTableBuilder::default()
    }

    /// The process-wide table, built once on first use.
    pub fn standard() -> Arc<RateTable> {
        Arc::clone(&STANDARD)
    }

    /// Look up a rate, reporting how it was resolved.
    pub fn lookup(&self, from: &str, to: &str) -> RateLookup {
        if let Some(rate) = self.rates.get(from).and_then(|row| row.get(to)) {
            return RateLookup {
                rate: *rate,
                source: RateSource::Table,
            };
        }
        let source = if from == to {
            RateSource::Parity
        } else {
            RateSource::Fallback
        };
        RateLookup {
            rate: Decimal::ONE,
            source,
        }
    }

    /// Rate for `from -> to`; unknown pairs resolve to 1.
    pub fn rate(&self, from: &str, to: &str) -> Decimal {
        self.lookup(from, to).rate
    }

    /// Look up a typed pair.
    pub fn lookup_pair(&self, pair: &CurrencyPair) -> RateLookup {
        self.lookup(pair.base.code(), pair.quote.code())
    }

    /// Whether the table holds an explicit entry for the pair.
    pub fn contains(&self, from: &str, to: &str) -> bool {
        self.lookup(from, to).source == RateSource::Table
    }

    /// All explicit pairs whose codes are supported currencies.
    pub fn supported_pairs(&self) -> Vec<CurrencyPair> {
        self.rates
            .iter()
            .flat_map(|(from, row)| row.keys().map(move |to| (from, to)))
            .filter_map(|(from, to)| {
                Some(CurrencyPair::new(
                    Currency::parse_normalized(from)?,
                    Currency::parse_normalized(to)?,
                ))
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.rates.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn build_standard() -> Self {
        // (from, to, mantissa, scale)
        const ENTRIES: &[(&str, &str, i64, u32)] = &[
            ("USD", "EUR", 85235, 5),
            ("USD", "GBP", 73121, 5),
            ("USD", "JPY", 11025, 2),
            ("USD", "CAD", 125430, 5),
            ("USD", "AUD", 135210, 5),
            ("USD", "CHF", 91840, 5),
            ("USD", "CNY", 645120, 5),
            ("USD", "SEK", 860450, 5),
            ("USD", "NZD", 141230, 5),
            ("USD", "MXN", 2012450, 5),
            ("USD", "SGD", 134560, 5),
            ("USD", "HKD", 777820, 5),
            ("USD", "NOK", 859340, 5),
            ("USD", "KRW", 118345, 2),
            ("USD", "TRY", 848120, 5),
            ("USD", "INR", 7432150, 5),
            ("USD", "BRL", 521340, 5),
            ("USD", "ZAR", 1434210, 5),
            ("USD", "DKK", 633910, 5),
            ("USD", "PLN", 388420, 5),
            ("EUR", "USD", 117320, 5),
            ("EUR", "GBP", 85790, 5),
            ("EUR", "JPY", 12935, 2),
            ("EUR", "CHF", 107750, 5),
            ("EUR", "CAD", 147160, 5),
            ("GBP", "USD", 136760, 5),
            ("GBP", "EUR", 116560, 5),
            ("GBP", "JPY", 15078, 2),
            ("GBP", "CHF", 125610, 5),
            ("JPY", "USD", 907, 5),
            ("JPY", "EUR", 773, 5),
            ("JPY", "GBP", 663, 5),
        ];

        ENTRIES
            .iter()
            .fold(RateTable::builder(), |builder, (from, to, mantissa, scale)| {
                builder.rate(*from, *to, Decimal::new(*mantissa, *scale))
            })
            .build()
    }
}

/// Builder for [`RateTable`].
#[derive(Debug, Default)]
pub struct RateTableBuilder {
    rates: BTreeMap<String, BTreeMap<String, Decimal>>,
}

impl RateTableBuilder {
    /// Add or replace a rate. Non-positive rates are ignored.
    pub fn rate(mut self, from: impl Into<String>, to: impl Into<String>, rate: Decimal) -> Self {
        if rate > Decimal::ZERO {
            self.rates
                .entry(from.into())
                .or_default()
                .insert(to.into(), rate);
        }
        self
    }

    pub fn build(self) -> RateTable {
        RateTable { rates: self.rates }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_standard_usd_eur() {
        let table = RateTable::standard();
        let lookup = table.lookup("USD", "EUR");
        assert_eq!(lookup.rate, dec!(0.85235));
        assert_eq!(lookup.source, RateSource::Table);
    }

    #[test]
    fn test_standard_is_shared() {
        assert!(Arc::ptr_eq(&RateTable::standard(), &RateTable::standard()));
    }

    #[test]
    fn test_missing_pair_falls_back_to_one() {
        let table = RateTable::standard();

        // Source row exists, pair does not.
        let lookup = table.lookup("USD", "XYZ");
        assert_eq!(lookup.rate, Decimal::ONE);
        assert!(lookup.is_fallback());

        // No source row at all.
        let lookup = table.lookup("SEK", "NOK");
        assert_eq!(lookup.rate, Decimal::ONE);
        assert!(lookup.is_fallback());
    }

    #[test]
    fn test_parity_is_distinct_from_fallback() {
        let table = RateTable::standard();
        let parity = table.lookup("USD", "USD");
        let fallback = table.lookup("CAD", "SEK");

        assert_eq!(parity.rate, fallback.rate);
        assert_eq!(parity.source, RateSource::Parity);
        assert_eq!(fallback.source, RateSource::Fallback);
    }

    #[test]
    fn test_explicit_parity_entry_is_table() {
        let table = RateTable::builder().rate("USD", "USD", Decimal::ONE).build();
        assert_eq!(table.lookup("USD", "USD").source, RateSource::Table);
    }

    #[test]
    fn test_builder_ignores_non_positive() {
        let table = RateTable::builder()
            .rate("USD", "EUR", dec!(0.9))
            .rate("USD", "GBP", Decimal::ZERO)
            .rate("USD", "JPY", dec!(-1))
            .build();

        assert_eq!(table.len(), 1);
        assert!(table.contains("USD", "EUR"));
        assert!(!table.contains("USD", "GBP"));
    }

    #[test]
    fn test_supported_pairs() {
        let table = RateTable::builder()
            .rate("USD", "EUR", dec!(0.9))
            .rate("EUR", "USD", dec!(1.1))
            .rate("ABC", "USD", dec!(2))
            .build();

        let pairs = table.supported_pairs();
        assert_eq!(pairs.len(), 2);
        assert!(pairs.contains(&CurrencyPair::new(Currency::usd(), Currency::eur())));
    }
}
