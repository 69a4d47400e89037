//! Art. 276 LISF default-interest (mora) calculation.
//!
//! The principal is denominated in UDI at the start date, grown by the
//! product of monthly factors derived from 1.25 x CCP-UDIS, and valued back in
//! MXN at the end-date UDI. `compute_mora` is the pure core over resolved
//! inputs; `calculate_mora_interest` fills missing UDI values and rates from a
//! `MarketDataProvider` and wraps the result in the standard envelope.

use std::time::Instant;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::compounding::{self, SegmentFactor, MORA_RATE_MULTIPLIER};
use crate::error::MoraError;
use crate::partition::{self, MonthSegment};
use crate::provider::{self, MarketDataProvider};
use crate::rates::{RateTable, ResolvedRate};
use crate::types::{round_money, with_metadata, ComputationOutput, Money, Rate, RoundingMode, Udi, YearMonth};
use crate::MoraResult;

/// History fetched before the first month so it can borrow an earlier rate.
pub const DEFAULT_RATE_LOOKBACK_MONTHS: u32 = 12;

// ---------------------------------------------------------------------------
// Input / Output types
// ---------------------------------------------------------------------------

/// A default-interest calculation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoraInput {
    /// Principal owed, in MXN
    pub principal_mxn: Money,
    /// First day of delinquency (ISO 8601)
    pub start_date: NaiveDate,
    /// Calculation / payment date (ISO 8601)
    pub end_date: NaiveDate,
    /// UDI value at the start date; fetched from the provider when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub udi_start: Option<Decimal>,
    /// UDI value at the end date; fetched from the provider when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub udi_end: Option<Decimal>,
    /// Count both endpoints of the interval (default) or treat it as `[start, end)`
    #[serde(default = "default_inclusive")]
    pub inclusive: bool,
}

fn default_inclusive() -> bool {
    true
}

/// Engine settings that are not part of an individual request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Months of CCP-UDIS history loaded before the first segment
    pub rate_lookback_months: u32,
    /// Rounding of the presented money/UDI figures
    pub rounding: RoundingMode,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            rate_lookback_months: DEFAULT_RATE_LOOKBACK_MONTHS,
            rounding: RoundingMode::default(),
        }
    }
}

/// Per-month line of the calculation breakdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentBreakdown {
    pub index: u32,
    pub month: YearMonth,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub days: u32,
    /// CCP-UDIS rate applied, in percent
    pub rate_pct: Decimal,
    /// Month the applied rate was published for
    pub rate_source_month: YearMonth,
    pub annual_rate: Rate,
    pub daily_rate: Rate,
    pub factor: Decimal,
    /// Product of this and all earlier factors
    pub cumulative_factor: Decimal,
    /// Interest compounded during this month: U0 x (Φ_j - Φ_{j-1}), unrounded
    pub interest_udi: Udi,
    /// interest_udi valued at the end-date UDI, unrounded
    pub interest_mxn: Money,
}

/// Result of a default-interest calculation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoraOutput {
    pub segment_count: usize,
    pub total_days: u32,
    /// Φ, at full precision
    pub cumulative_factor: Decimal,
    pub udi_start: Decimal,
    pub udi_end: Decimal,
    /// U0 = principal / UDI(start)
    pub principal_udi: Udi,
    /// U_final = U0 x Φ
    pub balance_udi: Udi,
    pub updated_principal_mxn: Money,
    pub interest_mxn: Money,
    pub total_mxn: Money,
    pub segments: Vec<SegmentBreakdown>,
}

// ---------------------------------------------------------------------------
// Calculation
// ---------------------------------------------------------------------------

fn validate_input(input: &MoraInput) -> MoraResult<()> {
    compounding::validate_positive("principal_mxn", input.principal_mxn)?;
    if input.end_date < input.start_date {
        return Err(MoraError::InvalidRange {
            start: input.start_date,
            end: input.end_date,
        });
    }
    if let Some(udi) = input.udi_start {
        compounding::validate_positive("udi_start", udi)?;
    }
    if let Some(udi) = input.udi_end {
        compounding::validate_positive("udi_end", udi)?;
    }
    Ok(())
}

/// Pure calculation over already-resolved UDI values and rates.
///
/// Fails atomically: if any month cannot be given a rate, no result is
/// produced.
pub fn compute_mora(
    input: &MoraInput,
    udi_start: Decimal,
    udi_end: Decimal,
    rates: &RateTable,
    config: &EngineConfig,
) -> MoraResult<MoraOutput> {
    validate_input(input)?;

    let segments = partition::partition_by_month(input.start_date, input.end_date, input.inclusive)?;
    let resolved = segments
        .iter()
        .map(|s| rates.resolve(s.month))
        .collect::<MoraResult<Vec<ResolvedRate>>>()?;

    let factors = segments
        .iter()
        .zip(&resolved)
        .map(|(s, r)| SegmentFactor::new(r.rate_pct, s.days))
        .collect::<MoraResult<Vec<SegmentFactor>>>()?;
    let running = compounding::running_factors(&factors)?;
    let phi = compounding::cumulative_factor(&factors)?;

    let conversion = compounding::convert(input.principal_mxn, udi_start, udi_end, phi)?;
    let round = |value: Decimal| round_money(value, config.rounding);

    Ok(MoraOutput {
        segment_count: segments.len(),
        total_days: segments.iter().map(|s| s.days).sum(),
        cumulative_factor: phi,
        udi_start,
        udi_end,
        principal_udi: round(conversion.principal_udi),
        balance_udi: round(conversion.balance_udi),
        updated_principal_mxn: round(conversion.updated_principal_mxn),
        interest_mxn: round(conversion.interest_mxn),
        total_mxn: round(conversion.total_mxn),
        segments: build_breakdown(
            &segments,
            &resolved,
            &factors,
            &running,
            conversion.principal_udi,
            udi_end,
        )?,
    })
}

fn build_breakdown(
    segments: &[MonthSegment],
    resolved: &[ResolvedRate],
    factors: &[SegmentFactor],
    running: &[Decimal],
    principal_udi: Udi,
    udi_end: Decimal,
) -> MoraResult<Vec<SegmentBreakdown>> {
    let overflow = || MoraError::InvalidInput {
        field: "principal_mxn".into(),
        reason: "Monthly interest overflows the decimal range".into(),
    };
    let mut previous = Decimal::ONE;
    segments
        .iter()
        .zip(resolved)
        .zip(factors.iter().zip(running))
        .map(|((s, r), (f, cumulative))| {
            // Φ_j - Φ_{j-1} telescopes, so the months add up to U0 x (Φ - 1).
            let interest_udi = principal_udi
                .checked_mul(*cumulative - previous)
                .ok_or_else(overflow)?;
            let interest_mxn = interest_udi.checked_mul(udi_end).ok_or_else(overflow)?;
            previous = *cumulative;
            Ok(SegmentBreakdown {
                index: s.index,
                month: s.month,
                start_date: s.start_date,
                end_date: s.end_date,
                days: s.days,
                rate_pct: r.rate_pct,
                rate_source_month: r.source_month,
                annual_rate: f.annual_rate,
                daily_rate: f.daily_rate,
                factor: f.factor,
                cumulative_factor: *cumulative,
                interest_udi,
                interest_mxn,
            })
        })
        .collect()
}

fn resolve_udi<P: MarketDataProvider + ?Sized>(
    given: Option<Decimal>,
    date: NaiveDate,
    provider: &P,
) -> MoraResult<Decimal> {
    match given {
        Some(value) => Ok(value),
        None => {
            let value = provider.udi_value(date)?;
            debug!(provider = provider.name(), %date, %value, "resolved UDI value");
            compounding::validate_positive("udi_value", value)?;
            Ok(value)
        }
    }
}

/// Calculate default interest, fetching whatever the request leaves out.
///
/// The request is validated before the provider is contacted.
pub fn calculate_mora_interest<P: MarketDataProvider + ?Sized>(
    input: &MoraInput,
    provider: &P,
    config: &EngineConfig,
) -> MoraResult<ComputationOutput<MoraOutput>> {
    let start = Instant::now();
    validate_input(input)?;

    let udi_start = resolve_udi(input.udi_start, input.start_date, provider)?;
    let udi_end = resolve_udi(input.udi_end, input.end_date, provider)?;

    let rates = provider::load_rate_table(
        provider,
        YearMonth::from_date(input.start_date),
        YearMonth::from_date(input.end_date),
        config.rate_lookback_months,
    )?;

    let output = compute_mora(input, udi_start, udi_end, &rates, config)?;

    let mut warnings: Vec<String> = Vec::new();
    for segment in output.segments.iter().filter(|s| s.month != s.rate_source_month) {
        warn!(
            month = %segment.month,
            source = %segment.rate_source_month,
            rate_pct = %segment.rate_pct,
            "CCP-UDIS not published, using earlier rate"
        );
        warnings.push(format!(
            "CCP-UDIS for {} not published; used {} rate of {}%",
            segment.month, segment.rate_source_month, segment.rate_pct
        ));
    }

    debug!(
        segments = output.segment_count,
        total_days = output.total_days,
        phi = %output.cumulative_factor,
        total_mxn = %output.total_mxn,
        "mora calculation complete"
    );

    let udi_source = |given: Option<Decimal>| if given.is_some() { "input" } else { provider.name() };
    let udi_start_source = udi_source(input.udi_start);
    let udi_end_source = udi_source(input.udi_end);

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Art. 276 LISF default interest: UDI-denominated, daily accrual, monthly compounding",
        &serde_json::json!({
            "rate_multiplier": MORA_RATE_MULTIPLIER.to_string(),
            "day_count": "Actual/365",
            "inclusive": input.inclusive,
            "rounding": config.rounding.to_string(),
            "rate_lookback_months": config.rate_lookback_months,
            "provider": provider.name(),
            "udi_start_source": udi_start_source,
            "udi_end_source": udi_end_source,
        }),
        warnings,
        elapsed,
        output,
    ))
}
