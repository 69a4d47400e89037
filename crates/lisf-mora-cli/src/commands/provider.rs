use clap::Args;

use lisf_mora_core::banxico::{self, BanxicoClient, BanxicoConfig};
use lisf_mora_core::provider::{MarketDataProvider, StaticMarketData};

use crate::input;

/// Where UDI and CCP-UDIS values come from
#[derive(Args, Debug)]
pub struct ProviderArgs {
    /// Offline market data file (JSON with `udi` and `ccp_udis` maps); skips Banxico
    #[arg(long)]
    pub market_data: Option<String>,

    /// Banxico SIE consultation token
    #[arg(long, env = "BANXICO_TOKEN", hide_env_values = true)]
    pub banxico_token: Option<String>,

    /// Banxico SIE base URL
    #[arg(long, env = "BANXICO_URL", default_value = banxico::DEFAULT_BASE_URL)]
    pub banxico_url: String,

    /// HTTP timeout for Banxico requests, in seconds
    #[arg(long, default_value_t = 30)]
    pub timeout_secs: u64,
}

impl ProviderArgs {
    /// Build the provider once; it is handed to the engine explicitly.
    pub fn build(&self) -> Result<Box<dyn MarketDataProvider>, Box<dyn std::error::Error>> {
        if let Some(ref path) = self.market_data {
            let data: StaticMarketData = input::file::read_input(path)?;
            tracing::debug!(
                path = %path,
                udi_points = data.udi.len(),
                ccp_udis_months = data.ccp_udis.len(),
                "using offline market data"
            );
            return Ok(Box::new(data));
        }

        let token = self
            .banxico_token
            .clone()
            .ok_or("--banxico-token (or BANXICO_TOKEN) is required unless --market-data is given")?;
        let client = BanxicoClient::new(BanxicoConfig {
            base_url: self.banxico_url.clone(),
            token,
            timeout_secs: self.timeout_secs,
        })?;
        Ok(Box::new(client))
    }
}
