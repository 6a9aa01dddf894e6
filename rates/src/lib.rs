//! Landed Rate Tables
//!
//! Read-only access to the versioned rule tables (duty, VAT, surcharges,
//! de-minimis thresholds, freight cards) and the as-of resolver that picks
//! the single legally-active row for a jurisdiction, product and date.
//!
//! # Example
//!
//! ```rust,ignore
//! use landed_rates::{MemoryRateStore, TemporalResolver};
//!
//! let store = Arc::new(MemoryRateStore::new());
//! store.insert_duty(duty_row);
//!
//! let resolver = TemporalResolver::new(store);
//! let duty = resolver.active_duty(&dest, &hs6, Some(&origin), on).await;
//! ```

pub mod error;
pub mod row;
pub mod threshold;
pub mod freight_card;
pub mod partner;
pub mod resolver;
pub mod reader;
pub mod store;

pub use error::{RateError, RateResult};
pub use row::{
    DutyRate, DutyRule, FixedBasis, RateKind, RateRow, RateTerms, RateType, SurchargeRate,
    VatBase, VatKind, VatOverride, VatRate,
};
pub use threshold::{DeMinimisBasis, DeMinimisKind, DeMinimisThreshold};
pub use freight_card::{FreightRateCard, FreightRateStep, FreightUnit};
pub use partner::PartnerToken;
pub use resolver::{
    resolve_active, resolve_active_by, select_duty, DutyMatch, DutyPreference, Lookup,
    TemporalResolver, Versioned,
};
pub use reader::{RateReader, RateTable};
pub use store::MemoryRateStore;
