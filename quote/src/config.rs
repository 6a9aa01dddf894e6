//! Quote configuration.

use landed_common::{ConfidenceLevel, CountryCode, Currency, Incoterm};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Destinations that collect VAT at checkout on low-value goods.
///
/// When de-minimis suppresses import VAT for a matching destination and
/// incoterm, the quote carries `checkout_vat = intrinsic value × VAT rate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutVatRule {
    pub dest: CountryCode,
    pub incoterms: Vec<Incoterm>,
}

impl CheckoutVatRule {
    /// Whether the rule covers a destination and incoterm.
    pub fn applies(&self, dest: &CountryCode, incoterm: Incoterm) -> bool {
        &self.dest == dest && self.incoterms.contains(&incoterm)
    }
}

/// Quote orchestration configuration.
#[derive(Debug, Clone)]
pub struct QuoteConfig {
    /// Settlement currency when the request names none.
    pub default_currency: Currency,
    /// Insurance as a percentage of item value, added to CIF.
    pub insurance_pct: Decimal,
    /// `guaranteed_max` buffer for estimated quotes, in percent.
    pub estimated_buffer_pct: Decimal,
    /// `guaranteed_max` buffer for quotes with missing data, in percent.
    pub missing_buffer_pct: Decimal,
    /// Checkout VAT collection rules.
    pub checkout_vat: Vec<CheckoutVatRule>,
    /// Fail the quote on an unresolvable FX pair instead of degrading.
    pub strict_fx: bool,
}

impl Default for QuoteConfig {
    fn default() -> Self {
        Self {
            default_currency: Currency::usd(),
            insurance_pct: Decimal::ZERO,
            estimated_buffer_pct: Decimal::TEN,
            missing_buffer_pct: Decimal::from(25),
            checkout_vat: Vec::new(),
            strict_fx: false,
        }
    }
}

impl QuoteConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(code) = std::env::var("LANDED_DEFAULT_CURRENCY") {
            if let Ok(currency) = Currency::parse(&code) {
                config.default_currency = currency;
            }
        }

        if let Ok(pct) = std::env::var("LANDED_INSURANCE_PCT") {
            if let Ok(pct) = pct.trim().parse() {
                config.insurance_pct = pct;
            }
        }

        if let Ok(strict) = std::env::var("LANDED_STRICT_FX") {
            config.strict_fx = matches!(strict.trim(), "1" | "true" | "TRUE" | "yes");
        }

        if let Ok(rules) = std::env::var("LANDED_CHECKOUT_VAT") {
            config.checkout_vat = parse_checkout_rules(&rules);
        }

        config
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.insurance_pct < Decimal::ZERO {
            return Err("Insurance percentage cannot be negative".to_string());
        }

        if self.estimated_buffer_pct < Decimal::ZERO || self.missing_buffer_pct < Decimal::ZERO {
            return Err("Guarantee buffers cannot be negative".to_string());
        }

        if self.missing_buffer_pct < self.estimated_buffer_pct {
            return Err("Missing-data buffer cannot be below the estimated buffer".to_string());
        }

        Ok(())
    }

    /// Buffer percentage applied to the total for a confidence level.
    pub fn buffer_pct(&self, confidence: ConfidenceLevel) -> Decimal {
        match confidence {
            ConfidenceLevel::Authoritative => Decimal::ZERO,
            ConfidenceLevel::Estimated => self.estimated_buffer_pct,
            ConfidenceLevel::Missing => self.missing_buffer_pct,
        }
    }

    /// Whether checkout VAT applies to a destination and incoterm.
    pub fn checkout_vat_applies(&self, dest: &CountryCode, incoterm: Incoterm) -> bool {
        self.checkout_vat.iter().any(|r| r.applies(dest, incoterm))
    }
}

/// Parse `GB=DAP,NO=DAP|DDP` into rules; malformed entries are skipped.
fn parse_checkout_rules(raw: &str) -> Vec<CheckoutVatRule> {
    raw.split(',')
        .filter_map(|entry| {
            let (dest, terms) = entry.split_once('=')?;
            let dest = CountryCode::parse(dest).ok()?;
            let incoterms: Vec<Incoterm> = terms
                .split('|')
                .filter_map(|t| t.parse().ok())
                .collect();
            if incoterms.is_empty() {
                return None;
            }
            Some(CheckoutVatRule { dest, incoterms })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_default_config() {
        let config = QuoteConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.buffer_pct(ConfidenceLevel::Authoritative), Decimal::ZERO);
        assert_eq!(config.buffer_pct(ConfidenceLevel::Estimated), dec!(10));
        assert_eq!(config.buffer_pct(ConfidenceLevel::Missing), dec!(25));
    }

    #[test]
    fn test_invalid_config() {
        let mut config = QuoteConfig::default();
        config.insurance_pct = dec!(-1);
        assert!(config.validate().is_err());

        let mut config = QuoteConfig::default();
        config.missing_buffer_pct = dec!(5);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_checkout_rules() {
        let rules = parse_checkout_rules("GB=DAP, no=DAP|DDP,XX,FR=EXW");
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].dest.as_str(), "GB");
        assert_eq!(rules[1].incoterms, vec![Incoterm::Dap, Incoterm::Ddp]);

        let config = QuoteConfig {
            checkout_vat: rules,
            ..Default::default()
        };
        let gb = CountryCode::parse("GB").unwrap();
        assert!(config.checkout_vat_applies(&gb, Incoterm::Dap));
        assert!(!config.checkout_vat_applies(&gb, Incoterm::Ddp));
    }
}
