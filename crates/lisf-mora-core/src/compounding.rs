//! Per-segment growth factors and the UDI/MXN conversion.
//!
//! For a segment of `d` days at a published CCP-UDIS rate `c` (percent):
//!
//! ```text
//! r_a = 1.25 * c / 100
//! r_d = r_a / 365
//! F   = 1 + r_d * d
//! ```
//!
//! The cumulative factor is `Φ = F_1 * F_2 * ... * F_n`, multiplied strictly
//! in chronological order. Nothing here rounds; presentation rounding is the
//! caller's last step.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::MoraError;
use crate::types::{Money, Rate, Udi};
use crate::MoraResult;

/// Art. 276 LISF multiplier applied to the CCP-UDIS rate.
pub const MORA_RATE_MULTIPLIER: Decimal = dec!(1.25);

/// Actual/365 basis.
pub const DAYS_PER_YEAR: Decimal = dec!(365);

const PERCENT: Decimal = dec!(100);

/// Growth of one month segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentFactor {
    /// 1.25 x CCP-UDIS, as a decimal
    pub annual_rate: Rate,
    /// annual_rate / 365
    pub daily_rate: Rate,
    /// 1 + daily_rate x days
    pub factor: Decimal,
}

impl SegmentFactor {
    pub fn new(rate_pct: Decimal, days: u32) -> MoraResult<Self> {
        let annual_rate = checked(
            "rate_pct",
            MORA_RATE_MULTIPLIER
                .checked_mul(rate_pct)
                .and_then(|r| r.checked_div(PERCENT)),
        )?;
        let daily_rate = checked("rate_pct", annual_rate.checked_div(DAYS_PER_YEAR))?;
        let factor = checked(
            "rate_pct",
            daily_rate
                .checked_mul(Decimal::from(days))
                .and_then(|growth| Decimal::ONE.checked_add(growth)),
        )?;
        Ok(Self {
            annual_rate,
            daily_rate,
            factor,
        })
    }
}

/// Turn a `checked_*` result into an error naming the offending input.
fn checked(field: &str, value: Option<Decimal>) -> MoraResult<Decimal> {
    value.ok_or_else(|| MoraError::InvalidInput {
        field: field.into(),
        reason: "Result overflows the decimal range".into(),
    })
}

/// Φ: left-to-right product of the factors. An empty slice gives 1.
pub fn cumulative_factor(factors: &[SegmentFactor]) -> MoraResult<Decimal> {
    factors.iter().try_fold(Decimal::ONE, |phi, segment| {
        checked("rate_pct", phi.checked_mul(segment.factor))
    })
}

/// Running products `Φ_1, Φ_1·F_2, ...` in chronological order.
pub fn running_factors(factors: &[SegmentFactor]) -> MoraResult<Vec<Decimal>> {
    let mut phi = Decimal::ONE;
    factors
        .iter()
        .map(|segment| {
            phi = checked("rate_pct", phi.checked_mul(segment.factor))?;
            Ok(phi)
        })
        .collect()
}

/// Full-precision result of denominating the principal in UDI and back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UdiConversion {
    /// U0 = principal / UDI(start)
    pub principal_udi: Udi,
    /// U_final = U0 x Φ
    pub balance_udi: Udi,
    /// U0 x UDI(end)
    pub updated_principal_mxn: Money,
    /// (U_final - U0) x UDI(end)
    pub interest_mxn: Money,
    /// U_final x UDI(end)
    pub total_mxn: Money,
}

pub fn validate_positive(field: &str, value: Decimal) -> MoraResult<()> {
    if value <= Decimal::ZERO {
        return Err(MoraError::InvalidInput {
            field: field.into(),
            reason: format!("Must be positive (got {value})"),
        });
    }
    Ok(())
}

/// Denominate `principal_mxn` in UDI at the start, grow it by `phi` and value
/// it at the end-date UDI.
pub fn convert(
    principal_mxn: Money,
    udi_start: Decimal,
    udi_end: Decimal,
    phi: Decimal,
) -> MoraResult<UdiConversion> {
    validate_positive("principal_mxn", principal_mxn)?;
    validate_positive("udi_start", udi_start)?;
    validate_positive("udi_end", udi_end)?;

    let principal_udi = checked("principal_mxn", principal_mxn.checked_div(udi_start))?;
    let balance_udi = checked("principal_mxn", principal_udi.checked_mul(phi))?;
    let interest_udi = checked("principal_mxn", balance_udi.checked_sub(principal_udi))?;

    Ok(UdiConversion {
        principal_udi,
        balance_udi,
        updated_principal_mxn: checked("principal_mxn", principal_udi.checked_mul(udi_end))?,
        interest_mxn: checked("principal_mxn", interest_udi.checked_mul(udi_end))?,
        total_mxn: checked("principal_mxn", balance_udi.checked_mul(udi_end))?,
    })
}
