//! Identifier types for lanes, jurisdictions and product codes.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::LandedError;

/// ISO 3166-1 alpha-2 country code, always two uppercase ASCII letters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CountryCode(String);

impl CountryCode {
    /// Parse a country code, normalizing to uppercase.
    pub fn parse(code: &str) -> Result<Self, LandedError> {
        let trimmed = code.trim();
        if !Self::is_valid(trimmed) {
            return Err(LandedError::invalid_field(
                "country",
                format!("'{}' is not an ISO 3166-1 alpha-2 code", code),
            ));
        }
        Ok(Self(trimmed.to_ascii_uppercase()))
    }

    /// Check whether a string is a well-formed alpha-2 code.
    pub fn is_valid(code: &str) -> bool {
        code.len() == 2 && code.chars().all(|c| c.is_ascii_alphabetic())
    }

    /// Get the code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CountryCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for CountryCode {
    type Error = LandedError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<CountryCode> for String {
    fn from(c: CountryCode) -> Self {
        c.0
    }
}

/// Six-digit Harmonized System product code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Hs6(String);

impl Hs6 {
    /// Parse an HS6 code. Dots and spaces (`8517.12`) are stripped.
    pub fn parse(code: &str) -> Result<Self, LandedError> {
        let digits: String = code.chars().filter(|c| *c != '.' && *c != ' ').collect();
        if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(LandedError::invalid_field(
                "hs6",
                format!("'{}' is not a 6-digit HS code", code),
            ));
        }
        Ok(Self(digits))
    }

    /// Get the code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The two-digit HS chapter.
    pub fn chapter(&self) -> &str {
        &self.0[..2]
    }
}

impl fmt::Display for Hs6 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for Hs6 {
    type Error = LandedError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<Hs6> for String {
    fn from(h: Hs6) -> Self {
        h.0
    }
}

/// Transport mode of a lane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportMode {
    Air,
    Sea,
}

impl fmt::Display for TransportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportMode::Air => write!(f, "air"),
            TransportMode::Sea => write!(f, "sea"),
        }
    }
}

/// A trade lane: origin, destination and mode.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Lane {
    pub origin: CountryCode,
    pub dest: CountryCode,
    pub mode: TransportMode,
}

impl Lane {
    /// Create a new lane.
    pub fn new(origin: CountryCode, dest: CountryCode, mode: TransportMode) -> Self {
        Self { origin, dest, mode }
    }
}

impl fmt::Display for Lane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{} ({})", self.origin, self.dest, self.mode)
    }
}

/// Delivery terms of the quote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Incoterm {
    /// Delivered At Place: buyer pays import charges on arrival.
    Dap,
    /// Delivered Duty Paid: seller pays import charges up front.
    Ddp,
}

impl fmt::Display for Incoterm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Incoterm::Dap => write!(f, "DAP"),
            Incoterm::Ddp => write!(f, "DDP"),
        }
    }
}

impl std::str::FromStr for Incoterm {
    type Err = LandedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "DAP" => Ok(Incoterm::Dap),
            "DDP" => Ok(Incoterm::Ddp),
            _ => Err(LandedError::invalid_field(
                "incoterm",
                format!("unsupported incoterm '{}'", s),
            )),
        }
    }
}

/// Package dimensions in centimetres.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionsCm {
    pub l: Decimal,
    pub w: Decimal,
    pub h: Decimal,
}

impl DimensionsCm {
    /// Create new dimensions.
    pub fn new(l: Decimal, w: Decimal, h: Decimal) -> Self {
        Self { l, w, h }
    }

    /// Volume in cubic centimetres.
    pub fn volume_cm3(&self) -> Decimal {
        self.l * self.w * self.h
    }
}

/// A single line of a shipment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShipmentItem {
    /// Explicit HS6 classification, if the caller has one.
    #[serde(default)]
    pub hs6: Option<Hs6>,
    /// Catalogue category, used by the classifier when `hs6` is absent.
    pub category_key: String,
    /// Customs value of the whole line.
    pub item_value: crate::Money,
    /// Dimensions of one unit.
    pub dims_cm: DimensionsCm,
    /// Weight of one unit.
    pub weight_kg: Decimal,
    #[serde(default)]
    pub quantity: Option<u32>,
    /// Volume of liquid per unit, for per-litre excise rows.
    #[serde(default)]
    pub liters: Option<Decimal>,
}

impl ShipmentItem {
    /// Number of units, at least one.
    pub fn units(&self) -> Decimal {
        Decimal::from(self.quantity.unwrap_or(1).max(1))
    }

    /// Gross weight of the line.
    pub fn total_weight_kg(&self) -> Decimal {
        self.weight_kg * self.units()
    }

    /// Total liquid volume of the line.
    pub fn total_liters(&self) -> Decimal {
        self.liters.unwrap_or(Decimal::ZERO) * self.units()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Currency, Money};
    use rust_decimal_macros::dec;

    #[test]
    fn test_country_code_parse() {
        assert_eq!(CountryCode::parse("us").unwrap().as_str(), "US");
        assert!(CountryCode::parse("USA").is_err());
        assert!(CountryCode::parse("1N").is_err());
        assert!(CountryCode::parse("").is_err());
    }

    #[test]
    fn test_hs6_parse() {
        assert_eq!(Hs6::parse("8517.12").unwrap().as_str(), "851712");
        assert_eq!(Hs6::parse("610910").unwrap().chapter(), "61");
        assert!(Hs6::parse("85171").is_err());
        assert!(Hs6::parse("85171A").is_err());
        assert!(Hs6::parse("85171200").is_err());
    }

    #[test]
    fn test_lane_serde() {
        let json = r#"{"origin":"cn","dest":"US","mode":"air"}"#;
        let lane: Lane = serde_json::from_str(json).unwrap();
        assert_eq!(lane.origin.as_str(), "CN");
        assert_eq!(lane.mode, TransportMode::Air);
        assert_eq!(lane.to_string(), "CN->US (air)");
    }

    #[test]
    fn test_incoterm_from_str() {
        assert_eq!("ddp".parse::<Incoterm>().unwrap(), Incoterm::Ddp);
        assert_eq!(" DAP ".parse::<Incoterm>().unwrap(), Incoterm::Dap);
        assert!("EXW".parse::<Incoterm>().is_err());
    }

    #[test]
    fn test_item_units() {
        let item = ShipmentItem {
            hs6: None,
            category_key: "wine".into(),
            item_value: Money::new(dec!(60), Currency::eur()),
            dims_cm: DimensionsCm::new(dec!(10), dec!(10), dec!(35)),
            weight_kg: dec!(1.5),
            quantity: Some(6),
            liters: Some(dec!(0.75)),
        };
        assert_eq!(item.units(), dec!(6));
        assert_eq!(item.total_weight_kg(), dec!(9.0));
        assert_eq!(item.total_liters(), dec!(4.50));
    }
}
