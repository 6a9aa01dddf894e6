//! Chargeable basis for freight pricing.

use landed_common::{DimensionsCm, ShipmentItem, TransportMode};
use landed_rates::FreightUnit;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{FreightError, FreightResult};

/// Air-freight dimensional factor: cubic centimetres per chargeable kilogram.
pub const VOLUMETRIC_DIVISOR_CM3_PER_KG: Decimal = Decimal::from_parts(5000, 0, 0, false, 0);

const CM3_PER_M3: Decimal = Decimal::from_parts(1_000_000, 0, 0, false, 0);

/// Measures a freight card can price against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ShipmentBasis {
    /// Gross weight.
    pub actual_kg: Decimal,
    /// Dimensional weight, `volume_cm3 / 5000`.
    pub volumetric_kg: Decimal,
    /// `max(actual_kg, volumetric_kg)` for a single line; summed for pools.
    pub chargeable_kg: Decimal,
    /// Volume in cubic metres.
    pub m3: Decimal,
}

impl ShipmentBasis {
    /// Basis for `quantity` units of the given size and weight.
    pub fn compute(dims: &DimensionsCm, weight_kg: Decimal, quantity: u32) -> FreightResult<Self> {
        if weight_kg < Decimal::ZERO {
            return Err(FreightError::InvalidMeasure {
                field: "weight_kg",
                reason: format!("{} is negative", weight_kg),
            });
        }
        if dims.l < Decimal::ZERO || dims.w < Decimal::ZERO || dims.h < Decimal::ZERO {
            return Err(FreightError::InvalidMeasure {
                field: "dims_cm",
                reason: "dimensions must be non-negative".to_string(),
            });
        }

        let units = Decimal::from(quantity.max(1));
        let volume_cm3 = dims.volume_cm3() * units;
        let actual_kg = weight_kg * units;
        let volumetric_kg = volume_cm3 / VOLUMETRIC_DIVISOR_CM3_PER_KG;

        Ok(Self {
            actual_kg,
            volumetric_kg,
            chargeable_kg: actual_kg.max(volumetric_kg),
            m3: volume_cm3 / CM3_PER_M3,
        })
    }

    /// Basis of a shipment line.
    pub fn for_item(item: &ShipmentItem) -> FreightResult<Self> {
        Self::compute(&item.dims_cm, item.weight_kg, item.quantity.unwrap_or(1))
    }

    /// Sum of several bases, as used for a pooled manifest.
    pub fn pooled<'a, I>(bases: I) -> Self
    where
        I: IntoIterator<Item = &'a ShipmentBasis>,
    {
        bases.into_iter().fold(Self::default(), |acc, b| Self {
            actual_kg: acc.actual_kg + b.actual_kg,
            volumetric_kg: acc.volumetric_kg + b.volumetric_kg,
            chargeable_kg: acc.chargeable_kg + b.chargeable_kg,
            m3: acc.m3 + b.m3,
        })
    }

    /// The quantity priced for a mode: chargeable kg by air, m3 by sea.
    pub fn priced_quantity(&self, mode: TransportMode) -> Decimal {
        match FreightUnit::for_mode(mode) {
            FreightUnit::Kg => self.chargeable_kg,
            FreightUnit::M3 => self.m3,
        }
    }
}
