pub mod compounding;
pub mod error;
pub mod mora;
pub mod partition;
pub mod provider;
pub mod rates;
pub mod types;

#[cfg(feature = "banxico")]
pub mod banxico;

pub use error::MoraError;
pub use types::*;

/// Standard result type for all mora operations
pub type MoraResult<T> = Result<T, MoraError>;
