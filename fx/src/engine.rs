//! Main FX engine implementation.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use landed_common::{day_key, Currency, CurrencyPair, Money};
use rust_decimal::Decimal;
use tracing::{debug, instrument, warn};

use crate::cache::{FxCache, FxCacheConfig};
use crate::conversion::{Converted, RatePath};
use crate::error::{FxError, FxResult};
use crate::provider::FxRateSource;

/// Configuration for the FX engine.
#[derive(Debug, Clone)]
pub struct FxEngineConfig {
    /// Lifetime of cached rates.
    pub cache_ttl: Duration,
    /// Hub currencies tried in order for triangulation.
    pub hub_currencies: Vec<Currency>,
}

impl Default for FxEngineConfig {
    fn default() -> Self {
        Self {
            cache_ttl: Duration::from_secs(600),
            hub_currencies: vec![Currency::eur(), Currency::usd()],
        }
    }
}

impl FxEngineConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(secs) = std::env::var("LANDED_FX_CACHE_TTL_SECS") {
            if let Ok(secs) = secs.parse() {
                config.cache_ttl = Duration::from_secs(secs);
            }
        }

        if let Ok(hubs) = std::env::var("LANDED_FX_HUBS") {
            let parsed: Vec<Currency> = hubs
                .split(',')
                .filter(|s| !s.trim().is_empty())
                .filter_map(|s| Currency::parse(s).ok())
                .collect();
            if !parsed.is_empty() {
                config.hub_currencies = parsed;
            }
        }

        config
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.cache_ttl.is_zero() {
            return Err("FX cache TTL cannot be 0".to_string());
        }

        for (i, hub) in self.hub_currencies.iter().enumerate() {
            if self.hub_currencies[..i].contains(hub) {
                return Err(format!("Duplicate hub currency {}", hub));
            }
        }

        Ok(())
    }

    /// Cache settings matching this engine configuration.
    pub fn cache_config(&self) -> FxCacheConfig {
        let defaults = FxCacheConfig::default();
        FxCacheConfig {
            ttl: chrono::Duration::from_std(self.cache_ttl).unwrap_or(defaults.ttl),
            ..defaults
        }
    }
}

/// Currency converter with a direct / inverse / triangulated fallback chain.
pub struct FxEngine {
    source: Arc<dyn FxRateSource>,
    cache: Arc<dyn FxCache>,
    config: FxEngineConfig,
}

impl FxEngine {
    /// Create a new engine over a rate source and a shared cache.
    pub fn new(source: Arc<dyn FxRateSource>, cache: Arc<dyn FxCache>, config: FxEngineConfig) -> Self {
        Self {
            source,
            cache,
            config,
        }
    }

    /// Engine configuration.
    pub fn config(&self) -> &FxEngineConfig {
        &self.config
    }

    /// Convert `amount` from one currency to another as of `on` (latest if `None`).
    ///
    /// When no rate resolves, strict mode fails with [`FxError::RateUnavailable`]
    /// and non-strict mode returns the input amount flagged `missing_rate`.
    #[instrument(skip(self), fields(from = %from, to = %to))]
    pub async fn convert(
        &self,
        amount: Decimal,
        from: &Currency,
        to: &Currency,
        on: Option<NaiveDate>,
        strict: bool,
    ) -> FxResult<Converted> {
        if from == to {
            return Ok(Converted::identity(amount));
        }

        match self.rate(from, to, on).await {
            Some((rate, path)) => {
                debug!(rate = %rate, path = ?path, "Resolved conversion rate");
                Ok(Converted::with_rate(amount, rate, path))
            }
            None if strict => Err(FxError::RateUnavailable {
                from: from.clone(),
                to: to.clone(),
                day: day_key(on),
            }),
            None => {
                warn!(day = %day_key(on), "No FX rate, passing amount through");
                Ok(Converted::missing(amount))
            }
        }
    }

    /// Convert a [`Money`] value into `to`.
    pub async fn convert_money(
        &self,
        money: &Money,
        to: &Currency,
        on: Option<NaiveDate>,
        strict: bool,
    ) -> FxResult<Converted> {
        self.convert(money.amount, &money.currency, to, on, strict).await
    }

    /// Resolve the effective rate for `from -> to`, trying each hub in order
    /// when neither direction is stored.
    pub async fn rate(
        &self,
        from: &Currency,
        to: &Currency,
        on: Option<NaiveDate>,
    ) -> Option<(Decimal, RatePath)> {
        if from == to {
            return Some((Decimal::ONE, RatePath::Identity));
        }

        let day = day_key(on);
        if let Some(found) = self.leg(&day, from, to, on).await {
            return Some(found);
        }

        for hub in &self.config.hub_currencies {
            if hub == from || hub == to {
                continue;
            }

            let Some((first, _)) = self.leg(&day, from, hub, on).await else {
                continue;
            };
            let Some((second, _)) = self.leg(&day, hub, to, on).await else {
                continue;
            };

            let rate = first * second;
            self.remember(&day, &CurrencyPair::new(from.clone(), to.clone()), rate);
            return Some((rate, RatePath::Triangulated(hub.clone())));
        }

        None
    }

    /// One leg: cache, then stored direct rate, then inverse of the stored reverse rate.
    async fn leg(
        &self,
        day: &str,
        from: &Currency,
        to: &Currency,
        on: Option<NaiveDate>,
    ) -> Option<(Decimal, RatePath)> {
        let pair = CurrencyPair::new(from.clone(), to.clone());

        if let Some(rate) = self.cache.get(day, &pair) {
            return Some((rate, RatePath::Cached));
        }

        if let Some(rate) = self.stored(&pair, on).await {
            self.remember(day, &pair, rate);
            return Some((rate, RatePath::Direct));
        }

        if let Some(reverse) = self.stored(&pair.inverse(), on).await {
            let rate = Decimal::ONE / reverse;
            self.remember(day, &pair, rate);
            return Some((rate, RatePath::Inverse));
        }

        None
    }

    /// A usable stored rate; source failures and non-positive rates count as misses.
    async fn stored(&self, pair: &CurrencyPair, on: Option<NaiveDate>) -> Option<Decimal> {
        match self.source.rate(pair, on).await {
            Ok(Some(rate)) if rate > Decimal::ZERO => Some(rate),
            Ok(Some(rate)) => {
                warn!(pair = %pair, rate = %rate, "Ignoring non-positive stored rate");
                None
            }
            Ok(None) => None,
            Err(e) => {
                warn!(source = self.source.name(), pair = %pair, error = %e, "Rate source failed");
                None
            }
        }
    }

    /// Cache a rate and its inverse.
    fn remember(&self, day: &str, pair: &CurrencyPair, rate: Decimal) {
        if rate <= Decimal::ZERO {
            return;
        }
        self.cache.put(day, pair, rate);
        self.cache.put(day, &pair.inverse(), Decimal::ONE / rate);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::TtlFxCache;
    use crate::provider::StaticRateSource;
    use landed_common::FxRate;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn cur(code: &str) -> Currency {
        Currency::parse(code).unwrap()
    }

    fn rate(base: &str, quote: &str, value: Decimal) -> FxRate {
        FxRate::new(CurrencyPair::new(cur(base), cur(quote)), value, None)
    }

    fn engine_with(rates: Vec<FxRate>) -> (FxEngine, Arc<StaticRateSource>) {
        let source = Arc::new(StaticRateSource::with_rates(rates));
        let cache = Arc::new(TtlFxCache::new());
        let engine = FxEngine::new(source.clone(), cache, FxEngineConfig::default());
        (engine, source)
    }

    #[tokio::test]
    async fn test_identity_conversion() {
        let (engine, source) = engine_with(vec![]);
        let converted = engine
            .convert(dec!(42.5), &Currency::usd(), &Currency::usd(), None, true)
            .await
            .unwrap();

        assert_eq!(converted.amount, dec!(42.5));
        assert_eq!(converted.path, RatePath::Identity);
        assert_eq!(source.lookups(), 0);
    }

    #[tokio::test]
    async fn test_direct_rate() {
        let (engine, _) = engine_with(vec![rate("USD", "EUR", dec!(0.92))]);
        let converted = engine
            .convert(dec!(100), &Currency::usd(), &Currency::eur(), None, true)
            .await
            .unwrap();

        assert_eq!(converted.amount, dec!(92.00));
        assert_eq!(converted.path, RatePath::Direct);
    }

    #[tokio::test]
    async fn test_inverse_rate() {
        let (engine, _) = engine_with(vec![rate("EUR", "USD", dec!(1.25))]);
        let converted = engine
            .convert(dec!(100), &Currency::usd(), &Currency::eur(), None, true)
            .await
            .unwrap();

        assert_eq!(converted.amount, dec!(80));
        assert_eq!(converted.rate, Some(dec!(0.8)));
        assert_eq!(converted.path, RatePath::Inverse);
    }

    #[tokio::test]
    async fn test_triangulation_prefers_first_hub() {
        let (engine, _) = engine_with(vec![
            rate("GBP", "EUR", dec!(1.2)),
            rate("EUR", "JPY", dec!(160)),
            rate("GBP", "USD", dec!(1.3)),
            rate("USD", "JPY", dec!(150)),
        ]);
        let converted = engine
            .convert(dec!(10), &Currency::gbp(), &Currency::jpy(), None, true)
            .await
            .unwrap();

        assert_eq!(converted.rate, Some(dec!(192.0)));
        assert_eq!(converted.amount, dec!(1920.0));
        assert_eq!(converted.path, RatePath::Triangulated(Currency::eur()));
    }

    #[tokio::test]
    async fn test_triangulation_falls_back_to_second_hub() {
        let (engine, _) = engine_with(vec![
            rate("GBP", "USD", dec!(1.3)),
            rate("JPY", "USD", dec!(0.005)),
        ]);
        let converted = engine
            .convert(dec!(1), &Currency::gbp(), &Currency::jpy(), None, true)
            .await
            .unwrap();

        assert_eq!(converted.amount, dec!(260));
        assert_eq!(converted.path, RatePath::Triangulated(Currency::usd()));
    }

    #[tokio::test]
    async fn test_cache_hit_avoids_source() {
        let (engine, source) = engine_with(vec![rate("USD", "EUR", dec!(0.92))]);

        engine
            .convert(dec!(1), &Currency::usd(), &Currency::eur(), None, true)
            .await
            .unwrap();
        let after_first = source.lookups();

        let second = engine
            .convert(dec!(1), &Currency::usd(), &Currency::eur(), None, true)
            .await
            .unwrap();
        assert_eq!(second.path, RatePath::Cached);
        assert_eq!(source.lookups(), after_first);

        // inverse was cached alongside
        let reverse = engine
            .convert(dec!(0.92), &Currency::eur(), &Currency::usd(), None, true)
            .await
            .unwrap();
        assert_eq!(reverse.path, RatePath::Cached);
        assert_eq!(source.lookups(), after_first);
    }

    #[tokio::test]
    async fn test_non_positive_rate_is_ignored() {
        let (engine, _) = engine_with(vec![rate("USD", "EUR", Decimal::ZERO)]);
        let converted = engine
            .convert(dec!(100), &Currency::usd(), &Currency::eur(), None, false)
            .await
            .unwrap();

        assert!(converted.missing_rate);
    }

    #[tokio::test]
    async fn test_missing_rate_non_strict() {
        let (engine, _) = engine_with(vec![]);
        let converted = engine
            .convert(dec!(55.10), &Currency::usd(), &cur("CHF"), None, false)
            .await
            .unwrap();

        assert_eq!(converted.amount, dec!(55.10));
        assert!(converted.missing_rate);
        assert_eq!(converted.path, RatePath::Missing);
    }

    #[tokio::test]
    async fn test_missing_rate_strict() {
        let (engine, _) = engine_with(vec![]);
        let on = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let result = engine
            .convert(dec!(1), &Currency::usd(), &cur("CHF"), Some(on), true)
            .await;

        assert_eq!(
            result,
            Err(FxError::RateUnavailable {
                from: Currency::usd(),
                to: cur("CHF"),
                day: "2024-05-01".to_string(),
            })
        );
    }

    #[test]
    fn test_default_config() {
        let config = FxEngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.cache_config().ttl, chrono::Duration::seconds(600));
    }

    #[test]
    fn test_invalid_config() {
        let mut config = FxEngineConfig::default();
        config.hub_currencies.push(Currency::eur());
        assert!(config.validate().is_err());

        let mut config = FxEngineConfig::default();
        config.cache_ttl = Duration::ZERO;
        assert!(config.validate().is_err());
    }

    proptest! {
        #[test]
        fn prop_round_trip_is_stable(cents in 1i64..10_000_000, rate_bp in 1i64..100_000) {
            let runtime = tokio::runtime::Runtime::new().unwrap();
            let amount = Decimal::new(cents, 2);
            let stored = Decimal::new(rate_bp, 4);
            let (engine, _) = engine_with(vec![rate("USD", "EUR", stored)]);

            let back = runtime.block_on(async {
                let there = engine
                    .convert(amount, &Currency::usd(), &Currency::eur(), None, true)
                    .await
                    .unwrap();
                engine
                    .convert(there.amount, &Currency::eur(), &Currency::usd(), None, true)
                    .await
                    .unwrap()
            });

            prop_assert_eq!(Currency::usd().round(back.amount), amount);
        }
    }
}
