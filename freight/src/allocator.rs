//! Freight lookup and pricing for a lane.

use chrono::NaiveDate;
use landed_common::{DimensionsCm, Lane, Money};
use landed_rates::{FreightUnit, Lookup, TemporalResolver};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::basis::ShipmentBasis;
use crate::error::FreightResult;
use crate::pricing::price_card;

/// A priced freight charge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreightCharge {
    pub lane: Lane,
    pub unit: FreightUnit,
    pub basis: ShipmentBasis,
    /// Quantity the card priced: chargeable kg by air, m3 by sea.
    pub priced_quantity: Decimal,
    pub step_upto: Decimal,
    pub price_per_unit: Decimal,
    pub min_applied: bool,
    /// Charge in the card's currency.
    pub amount: Money,
}

/// Prices freight against the active rate card for a lane.
#[derive(Clone)]
pub struct FreightAllocator {
    resolver: TemporalResolver,
}

impl FreightAllocator {
    /// Create an allocator over a resolver.
    pub fn new(resolver: TemporalResolver) -> Self {
        Self { resolver }
    }

    /// Freight for `quantity` units of the given size and weight on `lane`.
    ///
    /// `Ok(None)` means no active card; callers grade that as missing.
    pub async fn compute_freight(
        &self,
        lane: &Lane,
        dims: &DimensionsCm,
        weight_kg: Decimal,
        quantity: u32,
        on: NaiveDate,
    ) -> FreightResult<Option<FreightCharge>> {
        let basis = ShipmentBasis::compute(dims, weight_kg, quantity)?;
        Ok(self.price_basis(lane, &basis, on).await.row)
    }

    /// Price an already computed basis, keeping the card lookup status.
    #[instrument(skip(self, basis), fields(lane = %lane))]
    pub async fn price_basis(
        &self,
        lane: &Lane,
        basis: &ShipmentBasis,
        on: NaiveDate,
    ) -> Lookup<FreightCharge> {
        let unit = FreightUnit::for_mode(lane.mode);
        let lookup = self
            .resolver
            .active_freight_card(&lane.origin, &lane.dest, lane.mode, unit, on)
            .await;
        let status = lookup.status;

        let Some(card) = lookup.row else {
            warn!(status = ?status, on = %on, "No active freight card");
            return Lookup { status, row: None };
        };

        let quantity = basis.priced_quantity(lane.mode);
        let Some(price) = price_card(&card, quantity) else {
            warn!(scope = %card.scope_key(), "Freight card has no steps");
            return Lookup::no_match();
        };

        debug!(
            quantity = %quantity,
            unit = %unit,
            amount = %price.amount,
            "Priced freight"
        );

        Lookup {
            status,
            row: Some(FreightCharge {
                lane: lane.clone(),
                unit,
                basis: *basis,
                priced_quantity: quantity,
                step_upto: price.step_upto,
                price_per_unit: price.price_per_unit,
                min_applied: price.min_applied,
                amount: price.amount,
            }),
        }
    }
}
