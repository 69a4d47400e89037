//! UDI and CCP-UDIS data sources.
//!
//! The engine never reaches for a global client: callers construct a provider
//! and pass it in. `StaticMarketData` serves fixtures and offline files;
//! `crate::banxico::BanxicoClient` (feature `banxico`) talks to Banxico SIE.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::MoraError;
use crate::rates::RateTable;
use crate::types::{Rate, YearMonth};
use crate::MoraResult;

/// Source of UDI values and monthly CCP-UDIS rates.
pub trait MarketDataProvider {
    /// Short name used in errors and logs.
    fn name(&self) -> &str;

    /// UDI value published for `date`.
    fn udi_value(&self, date: NaiveDate) -> MoraResult<Decimal>;

    /// CCP-UDIS annual rate (percent) for `month`, `None` when unpublished.
    fn ccp_udis_rate(&self, month: YearMonth) -> MoraResult<Option<Rate>>;

    /// Every published rate in `from..=to`. Providers that can fetch a range
    /// in one request should override this.
    fn ccp_udis_rates(&self, from: YearMonth, to: YearMonth) -> MoraResult<RateTable> {
        let mut table = RateTable::new();
        let mut month = from;
        while month <= to {
            if let Some(rate) = self.ccp_udis_rate(month)? {
                table.insert(month, rate);
            }
            month = month.succ();
        }
        Ok(table)
    }
}

impl<P: MarketDataProvider + ?Sized> MarketDataProvider for &P {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn udi_value(&self, date: NaiveDate) -> MoraResult<Decimal> {
        (**self).udi_value(date)
    }

    fn ccp_udis_rate(&self, month: YearMonth) -> MoraResult<Option<Rate>> {
        (**self).ccp_udis_rate(month)
    }

    fn ccp_udis_rates(&self, from: YearMonth, to: YearMonth) -> MoraResult<RateTable> {
        (**self).ccp_udis_rates(from, to)
    }
}

impl<P: MarketDataProvider + ?Sized> MarketDataProvider for Box<P> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn udi_value(&self, date: NaiveDate) -> MoraResult<Decimal> {
        (**self).udi_value(date)
    }

    fn ccp_udis_rate(&self, month: YearMonth) -> MoraResult<Option<Rate>> {
        (**self).ccp_udis_rate(month)
    }

    fn ccp_udis_rates(&self, from: YearMonth, to: YearMonth) -> MoraResult<RateTable> {
        (**self).ccp_udis_rates(from, to)
    }
}

// ---------------------------------------------------------------------------
// Offline provider
// ---------------------------------------------------------------------------

/// In-memory market data, typically loaded from a JSON file:
///
/// ```json
/// {
///   "udi": { "2023-01-01": "7.646804", "2023-03-15": "7.788775" },
///   "ccp_udis": { "2023-01": "5.12", "2023-02": "5.20" }
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StaticMarketData {
    #[serde(default)]
    pub udi: BTreeMap<NaiveDate, Decimal>,
    #[serde(default)]
    pub ccp_udis: RateTable,
}

impl StaticMarketData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_udi(mut self, date: NaiveDate, value: Decimal) -> Self {
        self.udi.insert(date, value);
        self
    }

    pub fn with_rate(mut self, month: YearMonth, rate_pct: Decimal) -> Self {
        self.ccp_udis.insert(month, rate_pct);
        self
    }

    pub fn from_json(json: &str) -> MoraResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl MarketDataProvider for StaticMarketData {
    fn name(&self) -> &str {
        "static"
    }

    fn udi_value(&self, date: NaiveDate) -> MoraResult<Decimal> {
        self.udi
            .get(&date)
            .copied()
            .ok_or(MoraError::MissingUdiValue { date })
    }

    fn ccp_udis_rate(&self, month: YearMonth) -> MoraResult<Option<Rate>> {
        Ok(self.ccp_udis.get(month))
    }

    fn ccp_udis_rates(&self, from: YearMonth, to: YearMonth) -> MoraResult<RateTable> {
        Ok(self.ccp_udis.range(from, to).collect())
    }
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// A UDI observation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UdiQuote {
    pub date: NaiveDate,
    pub udi_value: Decimal,
}

/// A published monthly CCP-UDIS rate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyRate {
    pub month: YearMonth,
    pub rate_pct: Rate,
}

/// UDI value for a single date.
pub fn query_udi<P: MarketDataProvider + ?Sized>(provider: &P, date: NaiveDate) -> MoraResult<UdiQuote> {
    let udi_value = provider.udi_value(date)?;
    Ok(UdiQuote { date, udi_value })
}

/// Published CCP-UDIS rates for the months touched by `[from, to]`.
pub fn query_ccp_udis<P: MarketDataProvider + ?Sized>(
    provider: &P,
    from: NaiveDate,
    to: NaiveDate,
) -> MoraResult<Vec<MonthlyRate>> {
    if to < from {
        return Err(MoraError::InvalidRange { start: from, end: to });
    }
    let table = provider.ccp_udis_rates(YearMonth::from_date(from), YearMonth::from_date(to))?;
    Ok(table
        .iter()
        .map(|(month, rate_pct)| MonthlyRate { month, rate_pct })
        .collect())
}

/// Fetch the rates needed for `first..=last`, plus `lookback_months` of
/// history so the earliest months can fall back to an earlier publication.
pub fn load_rate_table<P: MarketDataProvider + ?Sized>(
    provider: &P,
    first: YearMonth,
    last: YearMonth,
    lookback_months: u32,
) -> MoraResult<RateTable> {
    let from = first.minus_months(lookback_months);
    debug!(
        provider = provider.name(),
        %from,
        to = %last,
        "loading CCP-UDIS rates"
    );
    let table = provider.ccp_udis_rates(from, last)?;
    debug!(provider = provider.name(), months = table.len(), "loaded CCP-UDIS rates");
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::cell::Cell;

    fn ym(y: i32, m: u32) -> YearMonth {
        YearMonth::new(y, m).unwrap()
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    /// Only implements the single-month lookup, to exercise the default range fetch.
    struct PerMonth {
        calls: Cell<u32>,
    }

    impl MarketDataProvider for PerMonth {
        fn name(&self) -> &str {
            "per-month"
        }

        fn udi_value(&self, date: NaiveDate) -> MoraResult<Decimal> {
            Err(MoraError::MissingUdiValue { date })
        }

        fn ccp_udis_rate(&self, month: YearMonth) -> MoraResult<Option<Rate>> {
            self.calls.set(self.calls.get() + 1);
            // Only even months are published
            Ok((month.month() % 2 == 0).then(|| Decimal::from(month.month())))
        }
    }

    #[test]
    fn test_default_range_fetch_skips_unpublished_months() {
        let provider = PerMonth { calls: Cell::new(0) };
        let table = provider.ccp_udis_rates(ym(2023, 1), ym(2023, 6)).unwrap();
        assert_eq!(provider.calls.get(), 6);
        assert_eq!(table.len(), 3);
        assert_eq!(table.get(ym(2023, 4)), Some(dec!(4)));
        assert_eq!(table.get(ym(2023, 5)), None);
    }

    #[test]
    fn test_static_provider_from_json() {
        let json = r#"{
            "udi": { "2023-01-01": "7.646804", "2023-03-15": 7.788775 },
            "ccp_udis": { "2023-01": "5.12", "2023-02": 5.20 }
        }"#;
        let data = StaticMarketData::from_json(json).unwrap();
        assert_eq!(data.udi_value(d(2023, 1, 1)).unwrap(), dec!(7.646804));
        assert_eq!(data.udi_value(d(2023, 3, 15)).unwrap(), dec!(7.788775));
        assert_eq!(data.ccp_udis_rate(ym(2023, 2)).unwrap(), Some(dec!(5.20)));
        assert_eq!(data.ccp_udis_rate(ym(2023, 3)).unwrap(), None);
    }

    #[test]
    fn test_static_provider_missing_udi() {
        let err = StaticMarketData::new().udi_value(d(2023, 1, 1)).unwrap_err();
        assert!(matches!(err, MoraError::MissingUdiValue { .. }));
    }

    #[test]
    fn test_query_ccp_udis_lists_published_months() {
        let data = StaticMarketData::new()
            .with_rate(ym(2022, 12), dec!(4.9))
            .with_rate(ym(2023, 1), dec!(5.0))
            .with_rate(ym(2023, 3), dec!(5.2))
            .with_rate(ym(2023, 4), dec!(5.3));
        let rates = query_ccp_udis(&data, d(2023, 1, 15), d(2023, 3, 2)).unwrap();
        let months: Vec<String> = rates.iter().map(|r| r.month.to_string()).collect();
        assert_eq!(months, vec!["2023-01", "2023-03"]);
    }

    #[test]
    fn test_query_ccp_udis_rejects_reversed_range() {
        let data = StaticMarketData::new();
        let err = query_ccp_udis(&data, d(2023, 3, 1), d(2023, 1, 1)).unwrap_err();
        assert!(matches!(err, MoraError::InvalidRange { .. }));
    }

    #[test]
    fn test_load_rate_table_includes_lookback() {
        let data = StaticMarketData::new()
            .with_rate(ym(2022, 1), dec!(3.0))
            .with_rate(ym(2022, 11), dec!(4.0))
            .with_rate(ym(2023, 2), dec!(5.0));
        let table = load_rate_table(&data, ym(2023, 1), ym(2023, 3), 3).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.resolve(ym(2023, 1)).unwrap().rate_pct, dec!(4.0));
    }

    #[test]
    fn test_query_udi_through_trait_object() {
        let data = StaticMarketData::new().with_udi(d(2024, 5, 1), dec!(8.1));
        let provider: Box<dyn MarketDataProvider> = Box::new(data);
        let quote = query_udi(&provider, d(2024, 5, 1)).unwrap();
        assert_eq!(quote.udi_value, dec!(8.1));
    }
}
