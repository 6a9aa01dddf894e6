//! Proportional allocation of a pooled charge.

use landed_common::Money;
use rust_decimal::Decimal;

use crate::error::{FreightError, FreightResult};

/// Split `total` across items in proportion to `bases`.
///
/// Shares are rounded to the currency's minor units and the rounding
/// remainder is placed on the largest share, so shares always sum to the
/// rounded total. A zero total basis splits evenly.
pub fn allocation_shares(bases: &[Decimal], total: &Money) -> FreightResult<Vec<Money>> {
    if bases.is_empty() {
        return Err(FreightError::NothingToAllocate);
    }
    if bases.iter().any(|b| *b < Decimal::ZERO) {
        return Err(FreightError::InvalidMeasure {
            field: "basis",
            reason: "allocation bases must be non-negative".to_string(),
        });
    }

    let currency = &total.currency;
    let target = currency.round(total.amount);
    let sum: Decimal = bases.iter().copied().sum();

    let mut shares: Vec<Decimal> = if sum.is_zero() {
        let even = currency.round(target / Decimal::from(bases.len()));
        vec![even; bases.len()]
    } else {
        bases
            .iter()
            .map(|b| currency.round(target * *b / sum))
            .collect()
    };

    let remainder = target - shares.iter().copied().sum::<Decimal>();
    if !remainder.is_zero() {
        if let Some(largest) = largest_index(&shares) {
            shares[largest] += remainder;
        }
    }

    Ok(shares
        .into_iter()
        .map(|amount| Money::new(amount, currency.clone()))
        .collect())
}

/// Index of the first largest share.
fn largest_index(shares: &[Decimal]) -> Option<usize> {
    let mut best: Option<(usize, Decimal)> = None;
    for (i, share) in shares.iter().enumerate() {
        match best {
            Some((_, top)) if top >= *share => {}
            _ => best = Some((i, *share)),
        }
    }
    best.map(|(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;
    use landed_common::Currency;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn usd(amount: Decimal) -> Money {
        Money::new(amount, Currency::usd())
    }

    fn amounts(shares: &[Money]) -> Vec<Decimal> {
        shares.iter().map(|m| m.amount).collect()
    }

    #[test]
    fn test_proportional_split() {
        let shares = allocation_shares(&[dec!(12), dec!(3)], &usd(dec!(45))).unwrap();
        assert_eq!(amounts(&shares), vec![dec!(36), dec!(9)]);
    }

    #[test]
    fn test_remainder_goes_to_largest_share() {
        let shares = allocation_shares(&[dec!(1), dec!(1), dec!(1)], &usd(dec!(100))).unwrap();
        assert_eq!(amounts(&shares), vec![dec!(33.34), dec!(33.33), dec!(33.33)]);

        let shares = allocation_shares(&[dec!(1), dec!(2)], &usd(dec!(0.10))).unwrap();
        assert_eq!(amounts(&shares).iter().sum::<Decimal>(), dec!(0.10));
    }

    #[test]
    fn test_zero_basis_splits_evenly() {
        let shares = allocation_shares(&[Decimal::ZERO, Decimal::ZERO], &usd(dec!(10))).unwrap();
        assert_eq!(amounts(&shares), vec![dec!(5), dec!(5)]);
    }

    #[test]
    fn test_minor_units_follow_currency() {
        let total = Money::new(dec!(1000), Currency::jpy());
        let shares = allocation_shares(&[dec!(1), dec!(2)], &total).unwrap();
        assert_eq!(amounts(&shares), vec![dec!(333), dec!(667)]);
    }

    #[test]
    fn test_empty_and_negative() {
        assert_eq!(
            allocation_shares(&[], &usd(dec!(1))),
            Err(FreightError::NothingToAllocate)
        );
        assert!(allocation_shares(&[dec!(-1)], &usd(dec!(1))).is_err());
    }

    proptest! {
        #[test]
        fn prop_shares_sum_to_total(
            bases in proptest::collection::vec(0u32..10_000, 1..12),
            cents in 0i64..100_000_000,
        ) {
            let bases: Vec<Decimal> = bases.into_iter().map(Decimal::from).collect();
            let total = usd(Decimal::new(cents, 2));
            let shares = allocation_shares(&bases, &total).unwrap();

            prop_assert_eq!(shares.len(), bases.len());
            prop_assert_eq!(amounts(&shares).iter().copied().sum::<Decimal>(), total.amount);
        }
    }
}
