use std::time::Instant;

use chrono::NaiveDate;
use clap::Args;
use serde_json::{json, Value};

use lisf_mora_core::provider::{self, MarketDataProvider};
use lisf_mora_core::with_metadata;

use crate::commands::provider::ProviderArgs;

/// Arguments for a UDI lookup
#[derive(Args)]
pub struct UdiArgs {
    /// Date to look up (YYYY-MM-DD)
    #[arg(long, alias = "fecha")]
    pub date: NaiveDate,

    #[command(flatten)]
    pub provider: ProviderArgs,
}

/// Arguments for a CCP-UDIS listing
#[derive(Args)]
pub struct CcpUdisArgs {
    /// First date of the range (YYYY-MM-DD)
    #[arg(long, alias = "fecha-inicio")]
    pub from: NaiveDate,

    /// Last date of the range (YYYY-MM-DD)
    #[arg(long, alias = "fecha-fin")]
    pub to: NaiveDate,

    #[command(flatten)]
    pub provider: ProviderArgs,
}

pub fn run_udi(args: UdiArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let start = Instant::now();
    let source = args.provider.build()?;
    let quote = provider::query_udi(&source, args.date)?;
    let output = with_metadata(
        "UDI value (Banxico series SP68257)",
        &json!({ "provider": source.name() }),
        Vec::new(),
        start.elapsed().as_micros() as u64,
        quote,
    );
    Ok(serde_json::to_value(output)?)
}

pub fn run_ccp_udis(args: CcpUdisArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let start = Instant::now();
    let source = args.provider.build()?;
    let rates = provider::query_ccp_udis(&source, args.from, args.to)?;

    let mut warnings = Vec::new();
    if rates.is_empty() {
        warnings.push(format!(
            "No CCP-UDIS rates published between {} and {}",
            args.from, args.to
        ));
    }

    let output = with_metadata(
        "CCP-UDIS monthly rates (Banxico series SF3368)",
        &json!({ "provider": source.name() }),
        warnings,
        start.elapsed().as_micros() as u64,
        json!({
            "from": args.from,
            "to": args.to,
            "rates": rates,
        }),
    );
    Ok(serde_json::to_value(output)?)
}
