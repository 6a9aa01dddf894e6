//! Landed FX Engine
//!
//! Currency conversion for landed-cost quotes.
//!
//! # Features
//!
//! - Direct, inverse and hub-triangulated rate resolution
//! - Injected per-process rate cache with TTL, keyed by valuation day
//! - Non-strict mode that degrades to "missing rate" metadata instead of failing
//!
//! # Example
//!
//! ```rust,ignore
//! use landed_fx::{FxEngine, FxEngineConfig, StaticRateSource, TtlFxCache};
//!
//! let source = Arc::new(StaticRateSource::new());
//! let cache = Arc::new(TtlFxCache::new());
//! let engine = FxEngine::new(source, cache, FxEngineConfig::default());
//!
//! let converted = engine.convert(dec!(100), &Currency::usd(), &Currency::eur(), Some(day), false).await?;
//! ```

pub mod engine;
pub mod provider;
pub mod cache;
pub mod conversion;
pub mod error;

pub use engine::{FxEngine, FxEngineConfig};
pub use provider::{rate_from_f64, FxRateSource, StaticRateSource};
pub use cache::{FxCache, FxCacheConfig, TtlFxCache};
pub use conversion::{Converted, RatePath};
pub use error::{FxError, FxResult};
