use chrono::NaiveDate;
use thiserror::Error;

use crate::types::YearMonth;

#[derive(Debug, Error)]
pub enum MoraError {
    #[error("Invalid range: end date {end} precedes start date {start}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("No CCP-UDIS rate published for {month} or any earlier month")]
    NoRateAvailable { month: YearMonth },

    #[error("No UDI value published for {date}")]
    MissingUdiValue { date: NaiveDate },

    #[error("Provider unavailable: {provider} — {reason}")]
    ProviderUnavailable { provider: String, reason: String },

    #[error("Date error: {0}")]
    DateError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for MoraError {
    fn from(e: serde_json::Error) -> Self {
        MoraError::SerializationError(e.to_string())
    }
}
