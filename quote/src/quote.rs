//! Quote request and result types.

use chrono::NaiveDate;
use landed_common::{ConfidenceLevel, Currency, Hs6, Incoterm, Lane, Money, ShipmentItem};
use landed_rates::{DutyPreference, VatBase, VatKind};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::deminimis::DeMinimisOutcome;
use crate::vat::VatSource;

/// A request to price one shipment line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteRequest {
    pub item: ShipmentItem,
    pub lane: Lane,
    /// Valuation date; today when absent.
    #[serde(default)]
    pub on: Option<NaiveDate>,
    pub incoterm: Incoterm,
    /// Settlement currency; the configured default when absent.
    #[serde(default)]
    pub currency: Option<Currency>,
}

/// Priced components, all in the settlement currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteComponents {
    pub cif: Money,
    pub duty: Money,
    pub vat: Money,
    pub fees: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checkout_vat: Option<Money>,
}

impl QuoteComponents {
    /// All-zero components in `currency`.
    pub fn zero(currency: &Currency) -> Self {
        Self {
            cif: Money::zero(currency.clone()),
            duty: Money::zero(currency.clone()),
            vat: Money::zero(currency.clone()),
            fees: Money::zero(currency.clone()),
            checkout_vat: None,
        }
    }

    /// `cif + duty + vat + fees + checkout_vat`.
    pub fn total(&self) -> Decimal {
        self.cif.amount
            + self.duty.amount
            + self.vat.amount
            + self.fees.amount
            + self.checkout_vat.as_ref().map_or(Decimal::ZERO, |m| m.amount)
    }

    /// Component-wise sum; both sides must share a currency.
    pub fn accumulate(&mut self, other: &QuoteComponents) {
        self.cif.amount += other.cif.amount;
        self.duty.amount += other.duty.amount;
        self.vat.amount += other.vat.amount;
        self.fees.amount += other.fees.amount;
        if let Some(extra) = &other.checkout_vat {
            let slot = self
                .checkout_vat
                .get_or_insert_with(|| Money::zero(extra.currency.clone()));
            slot.amount += extra.amount;
        }
    }
}

/// Confidence of each priced component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentConfidence {
    pub cif: ConfidenceLevel,
    pub freight: ConfidenceLevel,
    pub duty: ConfidenceLevel,
    pub vat: ConfidenceLevel,
    pub fees: ConfidenceLevel,
    pub de_minimis: ConfidenceLevel,
}

impl ComponentConfidence {
    /// Worst component.
    pub fn overall(&self) -> ConfidenceLevel {
        ConfidenceLevel::overall([
            self.cif,
            self.freight,
            self.duty,
            self.vat,
            self.fees,
            self.de_minimis,
        ])
    }
}

/// How the HS6 code was obtained.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "source", content = "name")]
pub enum Hs6Source {
    Explicit,
    Classifier(String),
}

/// Where the freight amount came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FreightSource {
    /// Priced on the lane's active rate card.
    Card,
    /// Share of a pooled manifest charge.
    Pooled,
    /// No freight could be priced.
    Missing,
}

/// The rules and parameters that shaped a quote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotePolicy {
    pub hs6_source: Hs6Source,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duty_preference: Option<DutyPreference>,
    pub duty_rate_pct: Decimal,
    pub vat_rate_pct: Decimal,
    pub vat_kind: VatKind,
    pub vat_base: VatBase,
    pub vat_source: VatSource,
    pub freight_source: FreightSource,
    pub insurance_pct: Decimal,
    pub buffer_pct: Decimal,
    pub strict_fx: bool,
    pub checkout_vat_applied: bool,
}

/// One matched surcharge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurchargeLine {
    pub code: String,
    pub amount: Money,
}

/// A priced landed-cost quote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub hs6: Hs6,
    pub currency: Currency,
    pub incoterm: Incoterm,
    pub on: NaiveDate,
    pub chargeable_kg: Decimal,
    pub freight: Money,
    pub de_minimis: DeMinimisOutcome,
    pub components: QuoteComponents,
    pub surcharges: Vec<SurchargeLine>,
    pub total: Money,
    pub guaranteed_max: Money,
    pub confidence: ConfidenceLevel,
    pub component_confidence: ComponentConfidence,
    /// FX pairs that did not resolve, as `FROM->TO`.
    #[serde(default)]
    pub missing_rates: Vec<String>,
    pub policy: QuotePolicy,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_components_total_and_accumulate() {
        let usd = Currency::usd();
        let mut sum = QuoteComponents::zero(&usd);
        let line = QuoteComponents {
            cif: Money::new(dec!(100), usd.clone()),
            duty: Money::new(dec!(5), usd.clone()),
            vat: Money::new(dec!(21), usd.clone()),
            fees: Money::new(dec!(1.5), usd.clone()),
            checkout_vat: Some(Money::new(dec!(2), usd.clone())),
        };
        assert_eq!(line.total(), dec!(129.5));

        sum.accumulate(&line);
        sum.accumulate(&line);
        assert_eq!(sum.duty.amount, dec!(10));
        assert_eq!(sum.checkout_vat.unwrap().amount, dec!(4));
    }

    #[test]
    fn test_overall_component_confidence() {
        let confidence = ComponentConfidence {
            cif: ConfidenceLevel::Authoritative,
            freight: ConfidenceLevel::Missing,
            duty: ConfidenceLevel::Authoritative,
            vat: ConfidenceLevel::Estimated,
            fees: ConfidenceLevel::Authoritative,
            de_minimis: ConfidenceLevel::Authoritative,
        };
        assert_eq!(confidence.overall(), ConfidenceLevel::Missing);
    }
}
