//! Rate reader trait implemented by the persistence layer.

use async_trait::async_trait;
use landed_common::{CountryCode, Hs6, TransportMode};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::RateResult;
use crate::freight_card::FreightRateCard;
use crate::row::{DutyRate, SurchargeRate, VatOverride, VatRate};
use crate::threshold::{DeMinimisKind, DeMinimisThreshold};

/// The versioned tables the engine reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateTable {
    Duty,
    Vat,
    VatOverride,
    Surcharge,
    DeMinimis,
    FreightCard,
}

impl fmt::Display for RateTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RateTable::Duty => "duty_rates",
            RateTable::Vat => "vat_rates",
            RateTable::VatOverride => "vat_overrides",
            RateTable::Surcharge => "surcharges",
            RateTable::DeMinimis => "de_minimis",
            RateTable::FreightCard => "freight_cards",
        };
        write!(f, "{}", name)
    }
}

/// Read access to candidate rows for a scope.
///
/// Implementations return every row for the scope regardless of dates; the
/// [`TemporalResolver`](crate::TemporalResolver) selects the active one.
/// Return [`RateError::NoDataset`](crate::RateError::NoDataset) when the table
/// is not loaded and [`RateError::OutOfScope`](crate::RateError::OutOfScope)
/// when it does not cover the destination. An empty vector means the table
/// covers the destination and holds no rows for the scope.
#[async_trait]
pub trait RateReader: Send + Sync {
    /// Duty rows for a destination and HS6, all rules and partners.
    async fn duty_rates(&self, dest: &CountryCode, hs6: &Hs6) -> RateResult<Vec<DutyRate>>;

    /// VAT rows for a destination, all bands.
    async fn vat_rates(&self, dest: &CountryCode) -> RateResult<Vec<VatRate>>;

    /// HS6-specific VAT overrides.
    async fn vat_overrides(&self, dest: &CountryCode, hs6: &Hs6) -> RateResult<Vec<VatOverride>>;

    /// Surcharges for a destination, any origin or HS6 scope.
    async fn surcharges(&self, dest: &CountryCode) -> RateResult<Vec<SurchargeRate>>;

    /// De-minimis thresholds for a destination and kind.
    async fn de_minimis(
        &self,
        dest: &CountryCode,
        kind: DeMinimisKind,
    ) -> RateResult<Vec<DeMinimisThreshold>>;

    /// Freight cards for a lane, any unit.
    async fn freight_cards(
        &self,
        origin: &CountryCode,
        dest: &CountryCode,
        mode: TransportMode,
    ) -> RateResult<Vec<FreightRateCard>>;
}
