//! Duty, VAT and surcharge rows.
//!
//! Rows are append-only: a correction is a new row with a later
//! `effective_from`, never an in-place edit.

use landed_common::{CountryCode, Currency, EffectiveWindow, Hs6, ShipmentItem};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{RateError, RateResult};

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// Discriminant of a rate row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateKind {
    Duty,
    Vat,
    VatOverride,
    Surcharge,
}

/// How a duty or surcharge amount is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateType {
    /// Percentage of the customs value.
    AdValorem,
    /// Fixed amount per basis unit.
    Specific,
    /// Percentage plus fixed amount.
    Compound,
}

/// Unit a fixed amount is charged per.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FixedBasis {
    #[default]
    PerShipment,
    PerUnit,
    PerKg,
    PerLiter,
}

/// Monetary terms shared by duty and surcharge rows.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RateTerms {
    /// Explicit type; inferred from the populated fields when absent.
    #[serde(default)]
    pub rate_type: Option<RateType>,
    /// Percentage, e.g. `5.0` for 5 %.
    #[serde(default)]
    pub rate_pct: Option<Decimal>,
    #[serde(default)]
    pub fixed_amt: Option<Decimal>,
    #[serde(default)]
    pub fixed_basis: FixedBasis,
    /// Currency of `fixed_amt`.
    #[serde(default)]
    pub currency: Option<Currency>,
}

impl RateTerms {
    /// Pure ad valorem terms.
    pub fn ad_valorem(rate_pct: Decimal) -> Self {
        Self {
            rate_type: Some(RateType::AdValorem),
            rate_pct: Some(rate_pct),
            ..Default::default()
        }
    }

    /// Pure specific terms.
    pub fn specific(fixed_amt: Decimal, basis: FixedBasis, currency: Currency) -> Self {
        Self {
            rate_type: Some(RateType::Specific),
            fixed_amt: Some(fixed_amt),
            fixed_basis: basis,
            currency: Some(currency),
            ..Default::default()
        }
    }

    /// Explicit type, or the one implied by which fields are populated.
    pub fn rate_type(&self, scope: &str) -> RateResult<RateType> {
        if let Some(explicit) = self.rate_type {
            return Ok(explicit);
        }
        match (self.rate_pct.is_some(), self.fixed_amt.is_some()) {
            (true, false) => Ok(RateType::AdValorem),
            (false, true) => Ok(RateType::Specific),
            (true, true) => Ok(RateType::Compound),
            (false, false) => Err(RateError::AmbiguousRateType(scope.to_string())),
        }
    }

    /// The percentage part applied to `base`, zero for specific rows.
    pub fn percentage_of(&self, base: Decimal, scope: &str) -> RateResult<Decimal> {
        match self.rate_type(scope)? {
            RateType::AdValorem | RateType::Compound => {
                Ok(base * self.rate_pct.unwrap_or(Decimal::ZERO) / HUNDRED)
            }
            RateType::Specific => Ok(Decimal::ZERO),
        }
    }

    /// The fixed part for `item`, in `self.currency`; zero for ad valorem rows.
    pub fn fixed_for(&self, item: &ShipmentItem, scope: &str) -> RateResult<Decimal> {
        match self.rate_type(scope)? {
            RateType::Specific | RateType::Compound => {
                let amount = self.fixed_amt.unwrap_or(Decimal::ZERO);
                let units = match self.fixed_basis {
                    FixedBasis::PerShipment => Decimal::ONE,
                    FixedBasis::PerUnit => item.units(),
                    FixedBasis::PerKg => item.total_weight_kg(),
                    FixedBasis::PerLiter => item.total_liters(),
                };
                Ok(amount * units)
            }
            RateType::AdValorem => Ok(Decimal::ZERO),
        }
    }
}

/// Whether a duty row is the standard rate or a trade-agreement rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DutyRule {
    #[default]
    Mfn,
    Fta,
}

/// Import duty for a destination and HS6 code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DutyRate {
    pub dest: CountryCode,
    pub hs6: Hs6,
    #[serde(default)]
    pub rule: DutyRule,
    /// Structured partner for preferential rows.
    #[serde(default)]
    pub partner: Option<CountryCode>,
    #[serde(flatten)]
    pub terms: RateTerms,
    #[serde(flatten)]
    pub window: EffectiveWindow,
    #[serde(default)]
    pub notes: Option<String>,
}

impl DutyRate {
    /// `dest[|partner]|hs6`.
    pub fn scope_key(&self) -> String {
        match &self.partner {
            Some(partner) => format!("{}|{}|{}", self.dest, partner, self.hs6),
            None => format!("{}|{}", self.dest, self.hs6),
        }
    }
}

/// VAT band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VatKind {
    #[default]
    Standard,
    Reduced,
    SuperReduced,
    Zero,
    Exempt,
}

impl fmt::Display for VatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            VatKind::Standard => "standard",
            VatKind::Reduced => "reduced",
            VatKind::SuperReduced => "super_reduced",
            VatKind::Zero => "zero",
            VatKind::Exempt => "exempt",
        };
        write!(f, "{}", name)
    }
}

/// Value VAT is levied on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VatBase {
    Cif,
    #[default]
    CifPlusDuty,
}

/// A destination's VAT rate for one band.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VatRate {
    pub dest: CountryCode,
    #[serde(default)]
    pub vat_kind: VatKind,
    pub rate_pct: Decimal,
    #[serde(default)]
    pub base: VatBase,
    #[serde(flatten)]
    pub window: EffectiveWindow,
}

impl VatRate {
    /// `dest|kind`.
    pub fn scope_key(&self) -> String {
        format!("{}|{}", self.dest, self.vat_kind)
    }
}

/// HS6-specific VAT treatment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VatOverride {
    pub dest: CountryCode,
    pub hs6: Hs6,
    /// Explicit rate, takes precedence over `vat_kind`.
    #[serde(default)]
    pub rate_pct: Option<Decimal>,
    /// Band to look up in the destination's VAT table.
    #[serde(default)]
    pub vat_kind: Option<VatKind>,
    #[serde(flatten)]
    pub window: EffectiveWindow,
    #[serde(default)]
    pub notes: Option<String>,
}

impl VatOverride {
    /// `dest|hs6`.
    pub fn scope_key(&self) -> String {
        format!("{}|{}", self.dest, self.hs6)
    }
}

/// A fee levied on imports into a destination, optionally scoped by origin or HS6.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurchargeRate {
    pub dest: CountryCode,
    /// Fee identifier, e.g. `MPF` or `HMF`.
    pub code: String,
    #[serde(default)]
    pub origin: Option<CountryCode>,
    #[serde(default)]
    pub hs6: Option<Hs6>,
    #[serde(flatten)]
    pub terms: RateTerms,
    #[serde(default)]
    pub min_amt: Option<Decimal>,
    #[serde(default)]
    pub max_amt: Option<Decimal>,
    #[serde(flatten)]
    pub window: EffectiveWindow,
}

impl SurchargeRate {
    /// `dest|code[|origin][|hs6]`.
    pub fn scope_key(&self) -> String {
        let mut key = format!("{}|{}", self.dest, self.code);
        if let Some(origin) = &self.origin {
            key.push('|');
            key.push_str(origin.as_str());
        }
        if let Some(hs6) = &self.hs6 {
            key.push('|');
            key.push_str(hs6.as_str());
        }
        key
    }

    /// Whether the row applies to the given origin and HS6.
    pub fn applies_to(&self, origin: &CountryCode, hs6: &Hs6) -> bool {
        self.origin.as_ref().map_or(true, |o| o == origin)
            && self.hs6.as_ref().map_or(true, |h| h == hs6)
    }

    /// Clamp a computed amount to the row's minimum and maximum.
    pub fn clamp(&self, amount: Decimal) -> Decimal {
        let floored = match self.min_amt {
            Some(min) if amount < min => min,
            _ => amount,
        };
        match self.max_amt {
            Some(max) if floored > max => max,
            _ => floored,
        }
    }
}

/// A rate row of any kind, tagged by `kind`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RateRow {
    Duty(DutyRate),
    Vat(VatRate),
    VatOverride(VatOverride),
    Surcharge(SurchargeRate),
}

impl RateRow {
    /// The row's discriminant.
    pub fn kind(&self) -> RateKind {
        match self {
            RateRow::Duty(_) => RateKind::Duty,
            RateRow::Vat(_) => RateKind::Vat,
            RateRow::VatOverride(_) => RateKind::VatOverride,
            RateRow::Surcharge(_) => RateKind::Surcharge,
        }
    }

    /// The scope key the row is versioned under.
    pub fn scope_key(&self) -> String {
        match self {
            RateRow::Duty(r) => r.scope_key(),
            RateRow::Vat(r) => r.scope_key(),
            RateRow::VatOverride(r) => r.scope_key(),
            RateRow::Surcharge(r) => r.scope_key(),
        }
    }

    /// Validate the row before it is accepted into a table.
    pub fn validate(&self) -> RateResult<()> {
        let window = match self {
            RateRow::Duty(r) => {
                r.terms.rate_type(&r.scope_key())?;
                &r.window
            }
            RateRow::Surcharge(r) => {
                r.terms.rate_type(&r.scope_key())?;
                &r.window
            }
            RateRow::Vat(r) => &r.window,
            RateRow::VatOverride(r) => &r.window,
        };
        if !window.is_well_formed() {
            return Err(RateError::InvalidRow {
                scope: self.scope_key(),
                reason: "effective_to must be after effective_from".to_string(),
            });
        }
        Ok(())
    }
}
