//! Landed Freight
//!
//! Freight pricing for landed-cost quotes: chargeable basis per transport
//! mode, step-priced rate cards, and proportional allocation of a pooled
//! charge across manifest items.

pub mod allocation;
pub mod allocator;
pub mod basis;
pub mod error;
pub mod pricing;

pub use allocation::allocation_shares;
pub use allocator::{FreightAllocator, FreightCharge};
pub use basis::{ShipmentBasis, VOLUMETRIC_DIVISOR_CM3_PER_KG};
pub use error::{FreightError, FreightResult};
pub use pricing::{price_card, CardPrice};
