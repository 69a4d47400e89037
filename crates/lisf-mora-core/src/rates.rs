//! Published CCP-UDIS rates keyed by calendar month.
//!
//! A month missing from the table is unpublished. Resolution scans backwards
//! to the nearest published month, independent of how the table was filled.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::MoraError;
use crate::types::YearMonth;
use crate::MoraResult;

/// Ordered mapping `YearMonth -> annual CCP-UDIS rate in percent`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RateTable {
    rates: BTreeMap<YearMonth, Decimal>,
}

/// A rate resolved for a month, possibly borrowed from an earlier month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedRate {
    /// Month the rate was requested for
    pub month: YearMonth,
    /// Month whose published rate was used
    pub source_month: YearMonth,
    /// Annual CCP-UDIS rate in percent (e.g. 5.12)
    pub rate_pct: Decimal,
}

impl ResolvedRate {
    pub fn is_fallback(&self) -> bool {
        self.month != self.source_month
    }
}

impl RateTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a published rate, replacing any earlier value for the month.
    pub fn insert(&mut self, month: YearMonth, rate_pct: Decimal) -> Option<Decimal> {
        self.rates.insert(month, rate_pct)
    }

    /// The published rate for exactly this month.
    pub fn get(&self, month: YearMonth) -> Option<Decimal> {
        self.rates.get(&month).copied()
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (YearMonth, Decimal)> + '_ {
        self.rates.iter().map(|(m, r)| (*m, *r))
    }

    /// Published rates in `from..=to`, chronologically.
    pub fn range(&self, from: YearMonth, to: YearMonth) -> impl Iterator<Item = (YearMonth, Decimal)> + '_ {
        let upper = if to < from { from } else { to };
        self.rates
            .range(from..=upper)
            .filter(move |(m, _)| **m <= to)
            .map(|(m, r)| (*m, *r))
    }

    /// Merge another table in, letting `other` win on conflicts.
    pub fn extend(&mut self, other: RateTable) {
        self.rates.extend(other.rates);
    }

    /// Rate for `month`, falling back to the most recent earlier published month.
    pub fn resolve(&self, month: YearMonth) -> MoraResult<ResolvedRate> {
        self.rates
            .range(..=month)
            .next_back()
            .map(|(source_month, rate_pct)| ResolvedRate {
                month,
                source_month: *source_month,
                rate_pct: *rate_pct,
            })
            .ok_or(MoraError::NoRateAvailable { month })
    }
}

impl FromIterator<(YearMonth, Decimal)> for RateTable {
    fn from_iter<I: IntoIterator<Item = (YearMonth, Decimal)>>(iter: I) -> Self {
        Self {
            rates: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn ym(y: i32, m: u32) -> YearMonth {
        YearMonth::new(y, m).unwrap()
    }

    #[test]
    fn test_resolve_exact_month() {
        let table: RateTable = [(ym(2023, 1), dec!(5.10)), (ym(2023, 2), dec!(5.20))]
            .into_iter()
            .collect();
        let r = table.resolve(ym(2023, 2)).unwrap();
        assert_eq!(r.rate_pct, dec!(5.20));
        assert!(!r.is_fallback());
    }

    #[test]
    fn test_resolve_falls_back_to_previous_month() {
        let table: RateTable = [(ym(2023, 1), dec!(5.10))].into_iter().collect();
        let r = table.resolve(ym(2023, 2)).unwrap();
        assert_eq!(r.rate_pct, dec!(5.10));
        assert_eq!(r.source_month, ym(2023, 1));
        assert!(r.is_fallback());
    }

    #[test]
    fn test_resolve_scans_across_year_boundary() {
        let table: RateTable = [(ym(2022, 10), dec!(4.75)), (ym(2023, 6), dec!(5.00))]
            .into_iter()
            .collect();
        let r = table.resolve(ym(2023, 3)).unwrap();
        assert_eq!(r.source_month, ym(2022, 10));
        assert_eq!(r.rate_pct, dec!(4.75));
    }

    #[test]
    fn test_resolve_ignores_later_months() {
        let table: RateTable = [(ym(2023, 6), dec!(5.00))].into_iter().collect();
        let err = table.resolve(ym(2023, 5)).unwrap_err();
        assert!(matches!(err, MoraError::NoRateAvailable { month } if month == ym(2023, 5)));
    }

    #[test]
    fn test_empty_table_has_no_rate() {
        assert!(RateTable::new().resolve(ym(2023, 1)).is_err());
    }

    #[test]
    fn test_range_is_inclusive_and_ordered() {
        let table: RateTable = (1..=6).map(|m| (ym(2023, m), Decimal::from(m))).collect();
        let months: Vec<u32> = table
            .range(ym(2023, 2), ym(2023, 4))
            .map(|(m, _)| m.month())
            .collect();
        assert_eq!(months, vec![2, 3, 4]);
        assert_eq!(table.range(ym(2023, 4), ym(2023, 2)).count(), 0);
    }

    #[test]
    fn test_table_serializes_as_month_map() {
        let table: RateTable = [(ym(2023, 1), dec!(5.1))].into_iter().collect();
        let json = serde_json::to_string(&table).unwrap();
        assert_eq!(json, r#"{"2023-01":"5.1"}"#);
        let back: RateTable = serde_json::from_str(&json).unwrap();
        assert_eq!(back, table);
    }
}
