//! Rate source traits and implementations.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::NaiveDate;
use landed_common::{CurrencyPair, FxRate};
use parking_lot::RwLock;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use tracing::debug;

use crate::error::{FxError, FxResult};

/// Source of stored conversion rates.
///
/// Implementations return only rates stored in the requested direction;
/// inversion and triangulation are the engine's job.
#[async_trait]
pub trait FxRateSource: Send + Sync {
    /// Get the source name.
    fn name(&self) -> &str;

    /// Stored rate for `pair` valid on `on` (`None` means latest).
    async fn rate(&self, pair: &CurrencyPair, on: Option<NaiveDate>) -> FxResult<Option<Decimal>>;
}

/// Convert a float rate from an external feed, rejecting NaN and infinities.
pub fn rate_from_f64(value: f64) -> FxResult<Decimal> {
    if !value.is_finite() {
        return Err(FxError::SourceError(format!("non-finite rate {}", value)));
    }
    Decimal::from_f64(value)
        .ok_or_else(|| FxError::SourceError(format!("unrepresentable rate {}", value)))
}

/// In-memory rate source.
///
/// For a dated lookup the most recent rate with `as_of <= on` wins, falling
/// back to an undated rate. For a latest lookup the most recent rate wins.
#[derive(Default)]
pub struct StaticRateSource {
    rates: RwLock<Vec<FxRate>>,
    lookups: AtomicUsize,
}

impl StaticRateSource {
    /// Create an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a source preloaded with rates.
    pub fn with_rates(rates: impl IntoIterator<Item = FxRate>) -> Self {
        let source = Self::new();
        for rate in rates {
            source.insert(rate);
        }
        source
    }

    /// Add a stored rate.
    pub fn insert(&self, rate: FxRate) {
        self.rates.write().push(rate);
    }

    /// Number of lookups served so far.
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::Relaxed)
    }

    /// Number of stored rates.
    pub fn len(&self) -> usize {
        self.rates.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.read().is_empty()
    }
}

#[async_trait]
impl FxRateSource for StaticRateSource {
    fn name(&self) -> &str {
        "STATIC"
    }

    async fn rate(&self, pair: &CurrencyPair, on: Option<NaiveDate>) -> FxResult<Option<Decimal>> {
        self.lookups.fetch_add(1, Ordering::Relaxed);

        let rates = self.rates.read();
        let candidates = rates.iter().filter(|r| &r.pair == pair);

        let best = match on {
            Some(day) => candidates
                .filter(|r| r.as_of.map_or(true, |as_of| as_of <= day))
                .max_by_key(|r| r.as_of),
            None => candidates.max_by_key(|r| r.as_of),
        };

        let rate = best.map(|r| r.rate);
        debug!(source = self.name(), pair = %pair, rate = ?rate, "Source lookup");
        Ok(rate)
    }
}
