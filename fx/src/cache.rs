//! FX rate caching with TTL support.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use landed_common::CurrencyPair;
use rust_decimal::Decimal;
use tracing::debug;

/// Process-wide rate cache, injected into the engine.
///
/// Keys are `(day, pair)` where `day` is `YYYY-MM-DD` or `latest`.
/// Concurrent writers to the same key are last-writer-wins.
pub trait FxCache: Send + Sync {
    /// Get an unexpired rate.
    fn get(&self, day: &str, pair: &CurrencyPair) -> Option<Decimal>;

    /// Store a rate. Non-positive rates are discarded.
    fn put(&self, day: &str, pair: &CurrencyPair, rate: Decimal);

    /// Drop expired entries.
    fn evict_expired(&self);

    /// Current cache statistics.
    fn stats(&self) -> CacheStats;
}

/// Cached rate entry.
#[derive(Debug, Clone)]
struct CacheEntry {
    value: Decimal,
    expires_at: DateTime<Utc>,
}

impl CacheEntry {
    fn is_valid(&self) -> bool {
        Utc::now() < self.expires_at
    }
}

/// Configuration for the rate cache.
#[derive(Debug, Clone)]
pub struct FxCacheConfig {
    /// Time-to-live of each entry.
    pub ttl: Duration,
    /// Maximum number of entries before expired ones are evicted on insert.
    pub max_entries: usize,
}

impl Default for FxCacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::minutes(10),
            max_entries: 10000,
        }
    }
}

/// Thread-safe TTL cache backed by a [`DashMap`].
pub struct TtlFxCache {
    entries: DashMap<String, CacheEntry>,
    config: FxCacheConfig,
}

impl TtlFxCache {
    /// Create a new cache with default configuration.
    pub fn new() -> Self {
        Self::with_config(FxCacheConfig::default())
    }

    /// Create a new cache with custom configuration.
    pub fn with_config(config: FxCacheConfig) -> Self {
        Self {
            entries: DashMap::new(),
            config,
        }
    }

    /// Number of entries, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Clear all cached rates.
    pub fn clear(&self) {
        self.entries.clear();
    }

    fn cache_key(day: &str, pair: &CurrencyPair) -> String {
        format!("{}|{}", day, pair.key())
    }
}

impl Default for TtlFxCache {
    fn default() -> Self {
        Self::new()
    }
}

impl FxCache for TtlFxCache {
    fn get(&self, day: &str, pair: &CurrencyPair) -> Option<Decimal> {
        let key = Self::cache_key(day, pair);

        if let Some(entry) = self.entries.get(&key) {
            if entry.is_valid() {
                debug!(key = %key, "Cache hit");
                return Some(entry.value);
            }
            debug!(key = %key, "Cache entry expired");
            drop(entry);
            // a fresh put may have landed since the read
            self.entries.remove_if(&key, |_, e| !e.is_valid());
        }

        debug!(key = %key, "Cache miss");
        None
    }

    fn put(&self, day: &str, pair: &CurrencyPair, rate: Decimal) {
        if rate <= Decimal::ZERO {
            debug!(pair = %pair, rate = %rate, "Refusing to cache non-positive rate");
            return;
        }

        if self.entries.len() >= self.config.max_entries {
            self.evict_expired();
        }

        self.entries.insert(
            Self::cache_key(day, pair),
            CacheEntry {
                value: rate,
                expires_at: Utc::now() + self.config.ttl,
            },
        );
    }

    fn evict_expired(&self) {
        self.entries.retain(|_, entry| entry.is_valid());
    }

    fn stats(&self) -> CacheStats {
        let total = self.entries.len();
        let valid = self.entries.iter().filter(|e| e.is_valid()).count();

        CacheStats {
            total_entries: total,
            valid_entries: valid,
            expired_entries: total - valid,
        }
    }
}

/// Cache statistics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStats {
    pub total_entries: usize,
    pub valid_entries: usize,
    pub expired_entries: usize,
}
