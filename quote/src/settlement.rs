//! Conversion into the settlement currency, recording unresolved pairs.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use landed_common::{Currency, Money};
use landed_fx::FxEngine;
use rust_decimal::Decimal;

use crate::error::QuoteResult;

/// Converts quote inputs into one settlement currency for a valuation day.
///
/// Non-strict misses pass the amount through unchanged and are remembered as
/// `FROM->TO` labels; strict misses fail.
pub struct SettlementConverter<'a> {
    fx: &'a FxEngine,
    currency: Currency,
    on: NaiveDate,
    strict: bool,
    missing: BTreeSet<String>,
}

impl<'a> SettlementConverter<'a> {
    pub fn new(fx: &'a FxEngine, currency: Currency, on: NaiveDate, strict: bool) -> Self {
        Self {
            fx,
            currency,
            on,
            strict,
            missing: BTreeSet::new(),
        }
    }

    /// Settlement currency.
    pub fn currency(&self) -> &Currency {
        &self.currency
    }

    /// Convert `amount` from `from`. The flag is true when no rate resolved.
    pub async fn convert(&mut self, amount: Decimal, from: &Currency) -> QuoteResult<(Decimal, bool)> {
        let converted = self
            .fx
            .convert(amount, from, &self.currency, Some(self.on), self.strict)
            .await?;
        if converted.missing_rate {
            self.missing.insert(format!("{}->{}", from, self.currency));
        }
        Ok((converted.amount, converted.missing_rate))
    }

    /// Convert a [`Money`] value.
    pub async fn convert_money(&mut self, money: &Money) -> QuoteResult<(Decimal, bool)> {
        self.convert(money.amount, &money.currency).await
    }

    /// Record a pair that failed elsewhere (e.g. a threshold conversion).
    pub fn record_missing(&mut self, pair: impl Into<String>) {
        self.missing.insert(pair.into());
    }

    /// Unresolved pairs, sorted.
    pub fn into_missing(self) -> Vec<String> {
        self.missing.into_iter().collect()
    }
}
