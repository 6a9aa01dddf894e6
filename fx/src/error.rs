//! FX engine error types.

use landed_common::{Currency, LandedError};
use thiserror::Error;

/// Errors that can occur in the FX engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FxError {
    /// No conversion path resolved (strict mode only).
    #[error("Rate unavailable for {from}->{to} on {day}")]
    RateUnavailable {
        from: Currency,
        to: Currency,
        day: String,
    },

    /// Rate source returned an error.
    #[error("Rate source error: {0}")]
    SourceError(String),

    /// Engine configuration is invalid.
    #[error("Invalid FX configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for FX operations.
pub type FxResult<T> = Result<T, FxError>;

impl From<FxError> for LandedError {
    fn from(err: FxError) -> Self {
        match err {
            FxError::RateUnavailable { from, to, day } => LandedError::RateUnavailable {
                from: from.to_string(),
                to: to.to_string(),
                day,
            },
            FxError::SourceError(msg) | FxError::InvalidConfig(msg) => LandedError::Internal(msg),
        }
    }
}
