//! Client-facing error taxonomy for landed-cost operations.

use thiserror::Error;

/// Errors surfaced to callers of the landed-cost engine.
///
/// Each component crate has its own error type that converts into this one.
/// Missing rate data is not an error at this level: the quote orchestrator
/// turns it into a degraded component instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LandedError {
    /// No conversion path between two currencies (strict FX only).
    #[error("FX rate unavailable for {from}->{to} on {day}")]
    RateUnavailable {
        from: String,
        to: String,
        day: String,
    },

    /// A rate row or freight card was not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// No HS6 code could be resolved for the item.
    #[error("Classification failed: {0}")]
    ClassificationFailed(String),

    /// Same idempotency key reused with a different request body.
    #[error("Idempotency conflict for {scope}/{key}")]
    IdempotencyConflict { scope: String, key: String },

    /// Gave up waiting on an in-flight idempotent computation.
    #[error("Timed out waiting for {scope}/{key}")]
    IdempotencyTimeout { scope: String, key: String },

    /// Not a three-letter ISO 4217 code.
    #[error("Invalid currency code: {0}")]
    InvalidCurrencyCode(String),

    /// A rate row has neither an explicit type nor enough fields to infer one.
    #[error("Ambiguous rate type for row {0}")]
    AmbiguousRateType(String),

    /// Malformed request input.
    #[error("Invalid input: {message}")]
    InvalidInput {
        message: String,
        field: Option<String>,
    },

    /// Internal failure (storage, serialization).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl LandedError {
    /// Create an invalid input error for a named field.
    pub fn invalid_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        LandedError::InvalidInput {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Whether the caller caused the error (maps to 4xx at the API boundary).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            LandedError::ClassificationFailed(_)
                | LandedError::IdempotencyConflict { .. }
                | LandedError::InvalidCurrencyCode(_)
                | LandedError::InvalidInput { .. }
        )
    }

    /// Get error code for API responses.
    pub fn error_code(&self) -> &'static str {
        match self {
            LandedError::RateUnavailable { .. } => "RATE_UNAVAILABLE",
            LandedError::NotFound(_) => "NOT_FOUND",
            LandedError::ClassificationFailed(_) => "CLASSIFICATION_FAILED",
            LandedError::IdempotencyConflict { .. } => "IDEMPOTENCY_CONFLICT",
            LandedError::IdempotencyTimeout { .. } => "IDEMPOTENCY_TIMEOUT",
            LandedError::InvalidCurrencyCode(_) => "INVALID_CURRENCY_CODE",
            LandedError::AmbiguousRateType(_) => "AMBIGUOUS_RATE_TYPE",
            LandedError::InvalidInput { .. } => "INVALID_INPUT",
            LandedError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

/// Result type alias for landed-cost operations.
pub type Result<T> = std::result::Result<T, LandedError>;
