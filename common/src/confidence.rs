//! Confidence grading for rate lookups and quotes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// How much a quoted figure can be trusted.
///
/// Ordered `Missing < Estimated < Authoritative`, so the overall confidence of a
/// quote is the minimum over its components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceLevel {
    Missing,
    Estimated,
    Authoritative,
}

impl ConfidenceLevel {
    /// The worst level among `levels`; `Authoritative` for an empty input.
    pub fn overall<I>(levels: I) -> Self
    where
        I: IntoIterator<Item = ConfidenceLevel>,
    {
        levels
            .into_iter()
            .min()
            .unwrap_or(ConfidenceLevel::Authoritative)
    }
}

impl fmt::Display for ConfidenceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfidenceLevel::Missing => write!(f, "missing"),
            ConfidenceLevel::Estimated => write!(f, "estimated"),
            ConfidenceLevel::Authoritative => write!(f, "authoritative"),
        }
    }
}

/// Outcome of a single rate-table lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupStatus {
    /// An active row was found.
    Ok,
    /// The table covers the jurisdiction but has no active row: an explicit zero.
    NoMatch,
    /// The jurisdiction is outside the dataset's coverage.
    OutOfScope,
    /// The table has not been loaded at all.
    NoDataset,
    /// The reader failed.
    Error,
}

impl LookupStatus {
    /// Confidence implied by this lookup outcome.
    pub fn confidence(&self) -> ConfidenceLevel {
        match self {
            LookupStatus::Ok | LookupStatus::NoMatch => ConfidenceLevel::Authoritative,
            LookupStatus::OutOfScope => ConfidenceLevel::Estimated,
            LookupStatus::NoDataset | LookupStatus::Error => ConfidenceLevel::Missing,
        }
    }
}
