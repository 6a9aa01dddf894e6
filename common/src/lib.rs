//! Landed Common Types
//!
//! Shared types used across the landed-cost engine: money and currencies,
//! trade lanes and product codes, confidence grading, and the client-facing
//! error taxonomy.

pub mod identifiers;
pub mod monetary;
pub mod confidence;
pub mod error;
pub mod time;

pub use identifiers::*;
pub use monetary::*;
pub use confidence::*;
pub use error::*;
pub use time::*;
