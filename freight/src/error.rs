//! Freight error types.

use landed_common::LandedError;
use thiserror::Error;

/// Errors raised while computing freight.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FreightError {
    /// Dimensions or weight are negative.
    #[error("Invalid {field}: {reason}")]
    InvalidMeasure { field: &'static str, reason: String },

    /// Pooled charge has no items to allocate to.
    #[error("Nothing to allocate")]
    NothingToAllocate,
}

/// Result type for freight operations.
pub type FreightResult<T> = Result<T, FreightError>;

impl From<FreightError> for LandedError {
    fn from(err: FreightError) -> Self {
        match err {
            FreightError::InvalidMeasure { field, reason } => {
                LandedError::invalid_field(field, reason)
            }
            FreightError::NothingToAllocate => {
                LandedError::invalid_field("items", "manifest has no items")
            }
        }
    }
}
