pub mod aggregation;
pub mod apportionment;
pub mod assumptions;
pub mod config;
pub mod error;
pub mod report;
pub mod source;
pub mod taxonomy;
pub mod types;

#[cfg(feature = "scenarios")]
pub mod scenarios;

#[cfg(feature = "incentives")]
pub mod incentives;

pub use error::CardMixError;
pub use types::*;

/// Standard result type for all card-mix operations
pub type CardMixResult<T> = Result<T, CardMixError>;
