//! De-minimis threshold rows.

use landed_common::{CountryCode, Currency, EffectiveWindow};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which charge a threshold waives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DeMinimisKind {
    Duty,
    Vat,
}

impl fmt::Display for DeMinimisKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeMinimisKind::Duty => write!(f, "DUTY"),
            DeMinimisKind::Vat => write!(f, "VAT"),
        }
    }
}

/// Value the threshold is compared against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DeMinimisBasis {
    /// Goods value only.
    Intrinsic,
    /// Goods plus freight plus insurance.
    Cif,
}

/// Value below which duty or VAT is waived. One active row per (dest, kind).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeMinimisThreshold {
    pub dest: CountryCode,
    pub kind: DeMinimisKind,
    pub basis: DeMinimisBasis,
    pub currency: Currency,
    pub value: Decimal,
    #[serde(flatten)]
    pub window: EffectiveWindow,
}

impl DeMinimisThreshold {
    /// `dest|kind`.
    pub fn scope_key(&self) -> String {
        format!("{}|{}", self.dest, self.kind)
    }

    /// Strictly below the threshold.
    pub fn is_under(&self, value: Decimal) -> bool {
        value < self.value
    }
}
