//! Landed Quote Engine
//!
//! Assembles duty, VAT, surcharges and freight into a priced landed-cost
//! quote in a single settlement currency, graded by confidence.
//!
//! # Features
//!
//! - HS6 from the request or a pluggable [`Classifier`]
//! - Preferential duty, HS6 VAT overrides and specificity-ranked surcharges
//! - Independent duty and VAT de-minimis suppression
//! - Degraded rather than failed quotes when rate data is missing
//! - Manifest pooling with proportional freight allocation
//!
//! # Example
//!
//! ```rust,ignore
//! use landed_quote::{QuoteOrchestrator, QuoteConfig, QuoteRequest};
//!
//! let orchestrator = QuoteOrchestrator::new(resolver, fx, classifier, QuoteConfig::from_env());
//! let quote = orchestrator.quote(&request).await?;
//! println!("{} ({})", quote.total, quote.confidence);
//! ```

pub mod classifier;
pub mod config;
pub mod deminimis;
pub mod error;
pub mod settlement;
pub mod orchestrator;
pub mod pool;
pub mod quote;
pub mod snapshot;
pub mod surcharge;
pub mod vat;

#[cfg(test)]
mod testing;

pub use classifier::{CategoryClassifier, Classification, Classifier};
pub use config::{CheckoutVatRule, QuoteConfig};
pub use deminimis::{DeMinimisEvaluator, DeMinimisOutcome, DeMinimisValues};
pub use error::{QuoteError, QuoteResult};
pub use orchestrator::{FreightInput, QuoteOrchestrator};
pub use pool::{Allocation, PoolAllocator, PoolItemResult, PoolRequest, PoolResult, PoolSummary};
pub use quote::{
    ComponentConfidence, FreightSource, Hs6Source, Quote, QuoteComponents, QuotePolicy,
    QuoteRequest, SurchargeLine,
};
pub use settlement::SettlementConverter;
pub use snapshot::{MemorySnapshotSink, Snapshot, SnapshotKind, SnapshotSink};
pub use surcharge::{rank_surcharges, specificity_score};
pub use vat::{resolve_vat, VatSelection, VatSource};
