//! Step pricing against a freight card.

use landed_common::Money;
use landed_rates::FreightRateCard;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Price of a basis quantity on a card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardPrice {
    /// Upper bound of the tier that was applied.
    pub step_upto: Decimal,
    pub price_per_unit: Decimal,
    /// Final charge in the card's currency.
    pub amount: Money,
    /// Whether the card minimum replaced the tier price.
    pub min_applied: bool,
}

/// Price `basis` on `card`: tier price × basis, floored at the card minimum,
/// then rounded to the nearest multiple of the card rounding (half away from zero).
///
/// Returns `None` only for a card without steps.
pub fn price_card(card: &FreightRateCard, basis: Decimal) -> Option<CardPrice> {
    let step = card.step_for(basis)?;

    let mut price = step.price_per_unit * basis;
    let mut min_applied = false;
    if let Some(min) = card.min_charge {
        if price < min {
            price = min;
            min_applied = true;
        }
    }

    if let Some(rounding) = card.price_rounding.filter(|r| *r > Decimal::ZERO) {
        price = (price / rounding).round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            * rounding;
    }

    Some(CardPrice {
        step_upto: step.upto_qty,
        price_per_unit: step.price_per_unit,
        amount: Money::new(price, card.currency.clone()),
        min_applied,
    })
}
