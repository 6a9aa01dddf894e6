//! Rate table error types.

use landed_common::{CountryCode, LandedError};
use thiserror::Error;

use crate::reader::RateTable;

/// Errors raised by rate readers and row validation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RateError {
    /// The table has not been loaded.
    #[error("No dataset loaded for {0}")]
    NoDataset(RateTable),

    /// The table is loaded but does not cover the jurisdiction.
    #[error("{dest} is outside the coverage of {table}")]
    OutOfScope { table: RateTable, dest: CountryCode },

    /// A row has neither an explicit rate type nor enough fields to infer one.
    #[error("Ambiguous rate type for row {0}")]
    AmbiguousRateType(String),

    /// A row failed validation.
    #[error("Invalid row {scope}: {reason}")]
    InvalidRow { scope: String, reason: String },

    /// Underlying storage failed.
    #[error("Storage error: {0}")]
    Storage(String),
}

/// Result type for rate table operations.
pub type RateResult<T> = Result<T, RateError>;

impl From<RateError> for LandedError {
    fn from(err: RateError) -> Self {
        match err {
            RateError::NoDataset(table) => LandedError::NotFound(format!("dataset {}", table)),
            RateError::OutOfScope { table, dest } => {
                LandedError::NotFound(format!("{} for {}", table, dest))
            }
            RateError::AmbiguousRateType(scope) => LandedError::AmbiguousRateType(scope),
            RateError::InvalidRow { scope, reason } => LandedError::InvalidInput {
                message: format!("{}: {}", scope, reason),
                field: None,
            },
            RateError::Storage(msg) => LandedError::Internal(msg),
        }
    }
}
