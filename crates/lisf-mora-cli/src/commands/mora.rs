use chrono::NaiveDate;
use clap::{ArgAction, Args, ValueEnum};
use rust_decimal::Decimal;
use serde_json::Value;

use lisf_mora_core::mora::{self, EngineConfig, MoraInput, DEFAULT_RATE_LOOKBACK_MONTHS};
use lisf_mora_core::RoundingMode;

use crate::commands::provider::ProviderArgs;
use crate::input;

/// Rounding applied to the final money and UDI figures
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum RoundingArg {
    /// Ties away from zero
    HalfUp,
    /// Ties to even (banker's rounding)
    HalfEven,
}

impl From<RoundingArg> for RoundingMode {
    fn from(value: RoundingArg) -> Self {
        match value {
            RoundingArg::HalfUp => RoundingMode::HalfUp,
            RoundingArg::HalfEven => RoundingMode::HalfEven,
        }
    }
}

/// Arguments for a default-interest calculation
#[derive(Args)]
pub struct CalculateArgs {
    /// Principal owed, in MXN
    #[arg(long)]
    pub principal: Option<Decimal>,

    /// First day of delinquency (YYYY-MM-DD)
    #[arg(long)]
    pub start: Option<NaiveDate>,

    /// Calculation / payment date (YYYY-MM-DD)
    #[arg(long)]
    pub end: Option<NaiveDate>,

    /// UDI value at the start date (fetched when omitted)
    #[arg(long)]
    pub udi_start: Option<Decimal>,

    /// UDI value at the end date (fetched when omitted)
    #[arg(long)]
    pub udi_end: Option<Decimal>,

    /// Count both endpoints of the period; `false` treats it as [start, end)
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    pub inclusive: bool,

    /// Rounding of the presented figures
    #[arg(long, value_enum, default_value_t = RoundingArg::HalfUp)]
    pub rounding: RoundingArg,

    /// Months of CCP-UDIS history searched when a month is unpublished
    #[arg(long, default_value_t = DEFAULT_RATE_LOOKBACK_MONTHS)]
    pub rate_lookback_months: u32,

    /// Path to a JSON or YAML request file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    #[command(flatten)]
    pub provider: ProviderArgs,
}

fn request_from_flags(args: &CalculateArgs) -> Result<MoraInput, Box<dyn std::error::Error>> {
    Ok(MoraInput {
        principal_mxn: args
            .principal
            .ok_or("--principal is required (or provide --input)")?,
        start_date: args.start.ok_or("--start is required (or provide --input)")?,
        end_date: args.end.ok_or("--end is required (or provide --input)")?,
        udi_start: args.udi_start,
        udi_end: args.udi_end,
        inclusive: args.inclusive,
    })
}

pub fn run_calculate(args: CalculateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mora_input: MoraInput = if let Some(ref path) = args.input {
        input::file::read_input(path)?
    } else if args.principal.is_some() {
        request_from_flags(&args)?
    } else if let Some(request) = input::stdin::read_request()? {
        request
    } else {
        request_from_flags(&args)?
    };

    let config = EngineConfig {
        rate_lookback_months: args.rate_lookback_months,
        rounding: args.rounding.into(),
    };
    let provider = args.provider.build()?;

    let result = mora::calculate_mora_interest(&mora_input, &provider, &config)?;
    Ok(serde_json::to_value(result)?)
}
