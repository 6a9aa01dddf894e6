//! Quote error types.

use landed_common::LandedError;
use landed_freight::FreightError;
use landed_fx::FxError;
use thiserror::Error;

/// Errors that abort a quote or pool computation.
///
/// Missing rate data never appears here; it degrades confidence instead.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QuoteError {
    /// No HS6 could be resolved for the item.
    #[error("Classification failed for category '{0}'")]
    ClassificationFailed(String),

    /// Strict FX conversion failed.
    #[error(transparent)]
    Fx(#[from] FxError),

    /// Malformed freight measures.
    #[error(transparent)]
    Freight(#[from] FreightError),

    /// Pool request without items.
    #[error("Manifest pool has no items")]
    EmptyManifest,

    /// Snapshot persistence failed.
    #[error("Snapshot error: {0}")]
    Snapshot(String),

    /// Quote configuration is invalid.
    #[error("Invalid quote configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for quote operations.
pub type QuoteResult<T> = Result<T, QuoteError>;

impl From<QuoteError> for LandedError {
    fn from(err: QuoteError) -> Self {
        match err {
            QuoteError::ClassificationFailed(category) => {
                LandedError::ClassificationFailed(category)
            }
            QuoteError::Fx(e) => e.into(),
            QuoteError::Freight(e) => e.into(),
            QuoteError::EmptyManifest => {
                LandedError::invalid_field("items", "manifest pool has no items")
            }
            QuoteError::Snapshot(msg) | QuoteError::InvalidConfig(msg) => {
                LandedError::Internal(msg)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use landed_common::Currency;

    #[test]
    fn test_error_mapping() {
        let err: LandedError = QuoteError::ClassificationFailed("widgets".into()).into();
        assert_eq!(err.error_code(), "CLASSIFICATION_FAILED");
        assert!(err.is_client_error());

        let err: LandedError = QuoteError::Fx(FxError::RateUnavailable {
            from: Currency::usd(),
            to: Currency::jpy(),
            day: "latest".into(),
        })
        .into();
        assert_eq!(err.error_code(), "RATE_UNAVAILABLE");

        let err: LandedError = QuoteError::EmptyManifest.into();
        assert_eq!(err.error_code(), "INVALID_INPUT");
    }
}
