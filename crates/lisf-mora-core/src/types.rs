use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::error::MoraError;
use crate::MoraResult;

/// MXN amounts. Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Amounts denominated in UDI (Unidades de Inversión).
pub type Udi = Decimal;

/// Rates expressed as decimals (0.05 = 5%) unless the field name says `_pct`.
pub type Rate = Decimal;

/// Number of fractional digits carried by every presented money/UDI figure.
pub const PRESENTATION_DP: u32 = 2;

// ---------------------------------------------------------------------------
// Calendar month key
// ---------------------------------------------------------------------------

/// A calendar month, ordered chronologically. Text form is `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct YearMonth {
    year: i32,
    month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> MoraResult<Self> {
        if !(1..=12).contains(&month) {
            return Err(MoraError::DateError(format!(
                "month {month} out of range for year {year}"
            )));
        }
        Ok(Self { year, month })
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn first_day(&self) -> MoraResult<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
            .ok_or_else(|| MoraError::DateError(format!("{self} is outside the calendar range")))
    }

    pub fn last_day(&self) -> MoraResult<NaiveDate> {
        self.succ()
            .first_day()?
            .pred_opt()
            .ok_or_else(|| MoraError::DateError(format!("{self} has no last day")))
    }

    /// The previous calendar month.
    pub fn pred(&self) -> Self {
        self.shift(-1)
    }

    /// The next calendar month.
    pub fn succ(&self) -> Self {
        self.shift(1)
    }

    /// Move `months` calendar months backwards.
    pub fn minus_months(&self, months: u32) -> Self {
        self.shift(-i64::from(months))
    }

    /// Number of months from `self` to `other` (negative when `other` is earlier).
    pub fn months_until(&self, other: YearMonth) -> i64 {
        other.ordinal() - self.ordinal()
    }

    fn ordinal(&self) -> i64 {
        i64::from(self.year) * 12 + i64::from(self.month) - 1
    }

    fn shift(&self, months: i64) -> Self {
        let ordinal = self.ordinal() + months;
        Self {
            year: ordinal.div_euclid(12) as i32,
            month: ordinal.rem_euclid(12) as u32 + 1,
        }
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for YearMonth {
    type Err = MoraError;

    /// Accepts `YYYY-MM` and, for convenience, a full `YYYY-MM-DD` date.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let invalid = || MoraError::DateError(format!("'{s}' is not a YYYY-MM month"));
        let mut parts = s.splitn(3, '-');
        let year = parts
            .next()
            .and_then(|p| p.parse::<i32>().ok())
            .ok_or_else(invalid)?;
        let month = parts
            .next()
            .and_then(|p| p.parse::<u32>().ok())
            .ok_or_else(invalid)?;
        if parts.next().is_some() {
            let date = NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| invalid())?;
            return Ok(YearMonth::from_date(date));
        }
        YearMonth::new(year, month)
    }
}

impl TryFrom<String> for YearMonth {
    type Error = MoraError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<YearMonth> for String {
    fn from(value: YearMonth) -> Self {
        value.to_string()
    }
}

// ---------------------------------------------------------------------------
// Rounding
// ---------------------------------------------------------------------------

/// Rounding applied to presented money and UDI figures.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RoundingMode {
    /// Ties away from zero (0.125 -> 0.13).
    #[default]
    HalfUp,
    /// Banker's rounding (0.125 -> 0.12).
    HalfEven,
}

impl RoundingMode {
    pub fn strategy(self) -> RoundingStrategy {
        match self {
            RoundingMode::HalfUp => RoundingStrategy::MidpointAwayFromZero,
            RoundingMode::HalfEven => RoundingStrategy::MidpointNearestEven,
        }
    }
}

impl fmt::Display for RoundingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoundingMode::HalfUp => f.write_str("half-up"),
            RoundingMode::HalfEven => f.write_str("half-even"),
        }
    }
}

/// Round to exactly two fractional digits. `10400` becomes `10400.00`.
pub fn round_money(value: Decimal, mode: RoundingMode) -> Decimal {
    let mut rounded = value.round_dp_with_strategy(PRESENTATION_DP, mode.strategy());
    rounded.rescale(PRESENTATION_DP);
    rounded
}

// ---------------------------------------------------------------------------
// Output envelope
// ---------------------------------------------------------------------------

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_year_month_wraps_across_years() {
        let jan = YearMonth::new(2024, 1).unwrap();
        assert_eq!(jan.pred(), YearMonth::new(2023, 12).unwrap());
        assert_eq!(jan.pred().succ(), jan);
        assert_eq!(jan.minus_months(13), YearMonth::new(2022, 12).unwrap());
        assert_eq!(jan.months_until(YearMonth::new(2024, 12).unwrap()), 11);
    }

    #[test]
    fn test_year_month_last_day_handles_leap_years() {
        let feb_2024 = YearMonth::new(2024, 2).unwrap();
        let feb_2023 = YearMonth::new(2023, 2).unwrap();
        let dec_2023 = YearMonth::new(2023, 12).unwrap();
        assert_eq!(feb_2024.last_day().unwrap(), NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
        assert_eq!(feb_2023.last_day().unwrap(), NaiveDate::from_ymd_opt(2023, 2, 28).unwrap());
        assert_eq!(dec_2023.last_day().unwrap(), NaiveDate::from_ymd_opt(2023, 12, 31).unwrap());
    }

    #[test]
    fn test_year_month_parse_and_display() {
        let m: YearMonth = "2023-03".parse().unwrap();
        assert_eq!(m.to_string(), "2023-03");
        let from_date: YearMonth = "2023-03-01".parse().unwrap();
        assert_eq!(from_date, m);
        assert!("2023-13".parse::<YearMonth>().is_err());
        assert!("March".parse::<YearMonth>().is_err());
        assert!("2023-03-garbage".parse::<YearMonth>().is_err());
        assert!("2023-02-30".parse::<YearMonth>().is_err());
        assert!("2023-03-".parse::<YearMonth>().is_err());
    }

    #[test]
    fn test_year_month_serde_as_string() {
        let m = YearMonth::new(2023, 7).unwrap();
        assert_eq!(serde_json::to_string(&m).unwrap(), "\"2023-07\"");
        let back: YearMonth = serde_json::from_str("\"2023-07\"").unwrap();
        assert_eq!(back, m);
    }

    #[test]
    fn test_round_money_always_two_digits() {
        assert_eq!(round_money(dec!(10400), RoundingMode::HalfUp).to_string(), "10400.00");
        assert_eq!(round_money(dec!(1.5), RoundingMode::HalfUp).to_string(), "1.50");
    }

    #[test]
    fn test_round_money_modes_differ_on_ties() {
        assert_eq!(round_money(dec!(0.125), RoundingMode::HalfUp), dec!(0.13));
        assert_eq!(round_money(dec!(0.125), RoundingMode::HalfEven), dec!(0.12));
        assert_eq!(round_money(dec!(0.135), RoundingMode::HalfEven), dec!(0.14));
        assert_eq!(round_money(dec!(-0.125), RoundingMode::HalfUp), dec!(-0.13));
    }
}
