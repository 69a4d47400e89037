pub mod market_data;
pub mod mora;
pub mod provider;
