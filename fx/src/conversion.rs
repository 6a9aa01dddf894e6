//! Conversion results.

use landed_common::{Currency, Money};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// How a conversion rate was obtained.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "path", content = "hub")]
pub enum RatePath {
    /// Same currency on both sides.
    Identity,
    /// Served from the rate cache.
    Cached,
    /// Stored rate in the requested direction.
    Direct,
    /// Reciprocal of the stored reverse-direction rate.
    Inverse,
    /// Product of two legs through a hub currency.
    Triangulated(Currency),
    /// No path resolved; the amount was passed through unchanged.
    Missing,
}

/// Outcome of a conversion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Converted {
    /// Converted amount, or the input amount when `missing_rate` is set.
    pub amount: Decimal,
    /// Effective rate applied, if any.
    pub rate: Option<Decimal>,
    pub path: RatePath,
    /// True when no rate resolved in non-strict mode.
    pub missing_rate: bool,
}

impl Converted {
    /// Same-currency conversion.
    pub fn identity(amount: Decimal) -> Self {
        Self {
            amount,
            rate: Some(Decimal::ONE),
            path: RatePath::Identity,
            missing_rate: false,
        }
    }

    /// Apply a resolved rate.
    pub fn with_rate(amount: Decimal, rate: Decimal, path: RatePath) -> Self {
        Self {
            amount: amount * rate,
            rate: Some(rate),
            path,
            missing_rate: false,
        }
    }

    /// Non-strict passthrough when no rate resolved.
    pub fn missing(amount: Decimal) -> Self {
        Self {
            amount,
            rate: None,
            path: RatePath::Missing,
            missing_rate: true,
        }
    }

    /// The converted amount labelled with the target currency.
    pub fn into_money(self, currency: Currency) -> Money {
        Money::new(self.amount, currency)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_with_rate() {
        let converted = Converted::with_rate(dec!(1000), dec!(0.92), RatePath::Direct);
        assert_eq!(converted.amount, dec!(920));
        assert!(!converted.missing_rate);
    }

    #[test]
    fn test_missing_passes_amount_through() {
        let converted = Converted::missing(dec!(12.34));
        assert_eq!(converted.amount, dec!(12.34));
        assert_eq!(converted.rate, None);
        assert!(converted.missing_rate);
    }

    #[test]
    fn test_path_serde() {
        let json = serde_json::to_value(RatePath::Triangulated(Currency::eur())).unwrap();
        assert_eq!(json["path"], "triangulated");
        assert_eq!(json["hub"], "EUR");
    }
}
