//! Idempotency errors.

use landed_common::LandedError;
use thiserror::Error;

/// Errors raised while guarding a keyed request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdempotencyError {
    /// The key was first used with a different request body.
    #[error("Idempotency conflict for {scope}/{key}")]
    Conflict { scope: String, key: String },

    /// Another caller still holds the lease.
    #[error("Timed out waiting for {scope}/{key}")]
    Timeout { scope: String, key: String },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Sink error: {0}")]
    Sink(String),
}

/// Result type for idempotency operations.
pub type IdempotencyResult<T> = std::result::Result<T, IdempotencyError>;

impl From<serde_json::Error> for IdempotencyError {
    fn from(e: serde_json::Error) -> Self {
        IdempotencyError::Serialization(e.to_string())
    }
}

impl From<IdempotencyError> for LandedError {
    fn from(e: IdempotencyError) -> Self {
        match e {
            IdempotencyError::Conflict { scope, key } => {
                LandedError::IdempotencyConflict { scope, key }
            }
            IdempotencyError::Timeout { scope, key } => LandedError::IdempotencyTimeout { scope, key },
            other => LandedError::Internal(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_landed_error() {
        let err: LandedError = IdempotencyError::Conflict {
            scope: "pools".into(),
            key: "k".into(),
        }
        .into();
        assert_eq!(err.error_code(), "IDEMPOTENCY_CONFLICT");

        let err: LandedError = IdempotencyError::Sink("down".into()).into();
        assert_eq!(err.error_code(), "INTERNAL_ERROR");
        assert!(!err.is_client_error());
    }
}
