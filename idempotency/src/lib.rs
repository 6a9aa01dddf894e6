//! Landed Idempotency
//!
//! At-most-once execution of keyed requests. A request key is held by a
//! renewable lease while its computation runs; the committed response is
//! replayed to every later caller presenting the same body.
//!
//! # Example
//!
//! ```rust,ignore
//! use landed_idempotency::{IdempotencyConfig, IdempotencyStore, MemorySink};
//!
//! let store = IdempotencyStore::new(Arc::new(MemorySink::new()), IdempotencyConfig::from_env());
//! let quote = store
//!     .with_idempotency("quotes", &key, &request, || orchestrator.quote(&request))
//!     .await?;
//! ```

pub mod config;
pub mod error;
pub mod hash;
pub mod record;
pub mod sink;
pub mod store;

pub use config::IdempotencyConfig;
pub use error::{IdempotencyError, IdempotencyResult};
pub use hash::{canonical_json, request_hash, sha256_hex};
pub use record::{IdempotencyRecord, Lease, RecordStatus};
pub use sink::{IdempotencySink, MemorySink};
pub use store::IdempotencyStore;
