//! Freight rate cards with step pricing.

use landed_common::{CountryCode, Currency, EffectiveWindow, TransportMode};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{RateError, RateResult};

/// Unit a card prices by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FreightUnit {
    Kg,
    M3,
}

impl FreightUnit {
    /// The unit a transport mode is priced in.
    pub fn for_mode(mode: TransportMode) -> Self {
        match mode {
            TransportMode::Air => FreightUnit::Kg,
            TransportMode::Sea => FreightUnit::M3,
        }
    }
}

impl fmt::Display for FreightUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FreightUnit::Kg => write!(f, "kg"),
            FreightUnit::M3 => write!(f, "m3"),
        }
    }
}

/// One price tier: applies to quantities up to `upto_qty`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreightRateStep {
    pub upto_qty: Decimal,
    pub price_per_unit: Decimal,
}

/// A versioned price list for a lane.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreightRateCard {
    pub origin: CountryCode,
    pub dest: CountryCode,
    pub mode: TransportMode,
    pub unit: FreightUnit,
    pub currency: Currency,
    #[serde(default)]
    pub min_charge: Option<Decimal>,
    #[serde(default)]
    pub price_rounding: Option<Decimal>,
    #[serde(flatten)]
    pub window: EffectiveWindow,
    /// Ascending by `upto_qty`, unique per card.
    pub steps: Vec<FreightRateStep>,
}

impl FreightRateCard {
    /// `origin|dest|mode|unit`.
    pub fn scope_key(&self) -> String {
        format!("{}|{}|{}|{}", self.origin, self.dest, self.mode, self.unit)
    }

    /// Check steps are present, strictly ascending and non-negative.
    pub fn validate(&self) -> RateResult<()> {
        let invalid = |reason: &str| RateError::InvalidRow {
            scope: self.scope_key(),
            reason: reason.to_string(),
        };

        if self.steps.is_empty() {
            return Err(invalid("card has no steps"));
        }
        if self
            .steps
            .windows(2)
            .any(|pair| pair[0].upto_qty >= pair[1].upto_qty)
        {
            return Err(invalid("steps must be strictly ascending by upto_qty"));
        }
        if self
            .steps
            .iter()
            .any(|s| s.upto_qty <= Decimal::ZERO || s.price_per_unit < Decimal::ZERO)
        {
            return Err(invalid("step quantities must be positive and prices non-negative"));
        }
        if matches!(self.price_rounding, Some(r) if r <= Decimal::ZERO) {
            return Err(invalid("price_rounding must be positive"));
        }
        if !self.window.is_well_formed() {
            return Err(invalid("effective_to must be after effective_from"));
        }
        Ok(())
    }

    /// The tier for `basis`: smallest `upto_qty >= basis`, else the top tier.
    pub fn step_for(&self, basis: Decimal) -> Option<&FreightRateStep> {
        self.steps
            .iter()
            .filter(|s| s.upto_qty >= basis)
            .min_by(|a, b| a.upto_qty.cmp(&b.upto_qty))
            .or_else(|| self.steps.iter().max_by(|a, b| a.upto_qty.cmp(&b.upto_qty)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn card(steps: Vec<(Decimal, Decimal)>) -> FreightRateCard {
        FreightRateCard {
            origin: CountryCode::parse("CN").unwrap(),
            dest: CountryCode::parse("US").unwrap(),
            mode: TransportMode::Air,
            unit: FreightUnit::Kg,
            currency: Currency::usd(),
            min_charge: None,
            price_rounding: None,
            window: EffectiveWindow::starting(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()),
            steps: steps
                .into_iter()
                .map(|(upto_qty, price_per_unit)| FreightRateStep {
                    upto_qty,
                    price_per_unit,
                })
                .collect(),
        }
    }

    #[test]
    fn test_step_selection() {
        let card = card(vec![(dec!(10), dec!(5)), (dec!(50), dec!(3))]);

        assert_eq!(card.step_for(dec!(5)).unwrap().price_per_unit, dec!(5));
        assert_eq!(card.step_for(dec!(10)).unwrap().price_per_unit, dec!(5));
        assert_eq!(card.step_for(dec!(10.01)).unwrap().price_per_unit, dec!(3));
        // above every tier clamps to the top one
        assert_eq!(card.step_for(dec!(100)).unwrap().price_per_unit, dec!(3));
    }

    #[test]
    fn test_validate() {
        assert!(card(vec![(dec!(10), dec!(5)), (dec!(50), dec!(3))]).validate().is_ok());
        assert!(card(vec![]).validate().is_err());
        assert!(card(vec![(dec!(50), dec!(3)), (dec!(10), dec!(5))]).validate().is_err());
        assert!(card(vec![(dec!(10), dec!(5)), (dec!(10), dec!(3))]).validate().is_err());

        let mut rounded = card(vec![(dec!(10), dec!(5))]);
        rounded.price_rounding = Some(Decimal::ZERO);
        assert!(rounded.validate().is_err());
    }
}
