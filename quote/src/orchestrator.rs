//! Quote orchestration.

use std::sync::Arc;

use landed_common::{today, ConfidenceLevel, Currency, Hs6, Money, ShipmentItem};
use landed_freight::{FreightAllocator, ShipmentBasis};
use landed_fx::FxEngine;
use landed_rates::{RateTerms, TemporalResolver, VatBase};
use rust_decimal::Decimal;
use tracing::{debug, info, instrument, warn};

use crate::classifier::Classifier;
use crate::config::QuoteConfig;
use crate::deminimis::{DeMinimisEvaluator, DeMinimisValues};
use crate::error::{QuoteError, QuoteResult};
use crate::quote::{
    ComponentConfidence, FreightSource, Hs6Source, Quote, QuoteComponents, QuotePolicy,
    QuoteRequest, SurchargeLine,
};
use crate::settlement::SettlementConverter;
use crate::surcharge::rank_surcharges;
use crate::vat::resolve_vat;

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// Freight to use for a quote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FreightInput {
    /// Price on the lane's active rate card.
    Card,
    /// Use a share of a pooled charge.
    Pooled {
        amount: Money,
        confidence: ConfidenceLevel,
    },
    /// The pooled charge could not be priced.
    Unpriced,
}

/// Assembles duty, VAT, surcharges and freight into a [`Quote`].
pub struct QuoteOrchestrator {
    resolver: TemporalResolver,
    fx: Arc<FxEngine>,
    freight: FreightAllocator,
    de_minimis: DeMinimisEvaluator,
    classifier: Arc<dyn Classifier>,
    config: QuoteConfig,
}

impl QuoteOrchestrator {
    /// Create an orchestrator.
    pub fn new(
        resolver: TemporalResolver,
        fx: Arc<FxEngine>,
        classifier: Arc<dyn Classifier>,
        config: QuoteConfig,
    ) -> Self {
        Self {
            freight: FreightAllocator::new(resolver.clone()),
            de_minimis: DeMinimisEvaluator::new(resolver.clone(), fx.clone()),
            resolver,
            fx,
            classifier,
            config,
        }
    }

    pub fn config(&self) -> &QuoteConfig {
        &self.config
    }

    pub fn freight(&self) -> &FreightAllocator {
        &self.freight
    }

    pub fn fx(&self) -> &FxEngine {
        &self.fx
    }

    /// Settlement currency for a request.
    pub fn settlement_currency(&self, requested: Option<&Currency>) -> Currency {
        requested
            .cloned()
            .unwrap_or_else(|| self.config.default_currency.clone())
    }

    /// Price a shipment line on its lane's freight card.
    ///
    /// Missing rate data degrades confidence; only classification and strict
    /// FX failures abort.
    pub async fn quote(&self, request: &QuoteRequest) -> QuoteResult<Quote> {
        self.quote_with_freight(request, FreightInput::Card).await
    }

    /// Price a shipment line with the given freight input.
    #[instrument(skip(self, request, freight), fields(lane = %request.lane, category = %request.item.category_key))]
    pub async fn quote_with_freight(
        &self,
        request: &QuoteRequest,
        freight: FreightInput,
    ) -> QuoteResult<Quote> {
        let item = &request.item;
        let lane = &request.lane;
        let on = request.on.unwrap_or_else(today);
        let currency = self.settlement_currency(request.currency.as_ref());
        let mut fx = SettlementConverter::new(&self.fx, currency.clone(), on, self.config.strict_fx);

        let (hs6, hs6_source) = self.resolve_hs6(item).await?;

        let duty_lookup = self
            .resolver
            .active_duty(&lane.dest, &hs6, Some(&lane.origin), on)
            .await;
        let vat = resolve_vat(&self.resolver, &lane.dest, &hs6, on).await;
        let surcharge_lookup = self
            .resolver
            .active_surcharges(&lane.dest, &lane.origin, &hs6, on)
            .await;

        // Freight
        let basis = ShipmentBasis::for_item(item)?;
        let (freight_amount, freight_confidence, freight_source) = match freight {
            FreightInput::Card => {
                let lookup = self.freight.price_basis(lane, &basis, on).await;
                let status_confidence = lookup.confidence();
                match lookup.row {
                    Some(charge) => {
                        let (amount, missed) = fx.convert_money(&charge.amount).await?;
                        (amount, degrade(status_confidence, missed), FreightSource::Card)
                    }
                    None => (Decimal::ZERO, ConfidenceLevel::Missing, FreightSource::Missing),
                }
            }
            FreightInput::Pooled { amount, confidence } => {
                let (converted, missed) = fx.convert_money(&amount).await?;
                (converted, degrade(confidence, missed), FreightSource::Pooled)
            }
            FreightInput::Unpriced => (Decimal::ZERO, ConfidenceLevel::Missing, FreightSource::Missing),
        };

        // CIF
        let (item_value, value_missed) = fx.convert_money(&item.item_value).await?;
        let insurance = item_value * self.config.insurance_pct / HUNDRED;
        let cif = item_value + freight_amount + insurance;
        let cif_confidence = degrade(ConfidenceLevel::Authoritative, value_missed).min(freight_confidence);

        // De-minimis
        let de_minimis = self
            .de_minimis
            .evaluate(
                &lane.dest,
                on,
                &DeMinimisValues {
                    intrinsic: item.item_value.clone(),
                    cif: Money::new(cif, currency.clone()),
                },
            )
            .await;
        for pair in &de_minimis.missing_rates {
            fx.record_missing(pair.clone());
        }

        // Duty
        let mut duty_confidence = duty_lookup.confidence();
        let duty_preference = duty_lookup.row.as_ref().map(|m| m.preference);
        let duty_rate_pct = duty_lookup
            .row
            .as_ref()
            .and_then(|m| m.rate.terms.rate_pct)
            .unwrap_or(Decimal::ZERO);
        let duty = match &duty_lookup.row {
            _ if de_minimis.suppress_duty => Decimal::ZERO,
            Some(matched) => {
                let scope = matched.rate.scope_key();
                match self.terms_amount(&matched.rate.terms, &scope, cif, item, &mut fx).await? {
                    Some((amount, missed)) => {
                        duty_confidence = degrade(duty_confidence, missed);
                        amount
                    }
                    None => {
                        duty_confidence = ConfidenceLevel::Missing;
                        Decimal::ZERO
                    }
                }
            }
            None => Decimal::ZERO,
        };

        // VAT
        let vat_base = match vat.base {
            VatBase::Cif => cif,
            VatBase::CifPlusDuty => cif + duty,
        };
        let vat_amount = if de_minimis.suppress_vat {
            Decimal::ZERO
        } else {
            vat_base * vat.rate_pct / HUNDRED
        };

        // Surcharges
        let mut fees_confidence = surcharge_lookup.confidence();
        let rows = surcharge_lookup.row.unwrap_or_default();
        let mut surcharges = Vec::new();
        for row in rank_surcharges(&rows, &lane.origin, &hs6) {
            let scope = row.scope_key();
            let Some((raw, missed)) = self.terms_amount(&row.terms, &scope, cif, item, &mut fx).await?
            else {
                fees_confidence = ConfidenceLevel::Missing;
                continue;
            };
            fees_confidence = degrade(fees_confidence, missed);

            // min/max are denominated in the row currency
            let row_currency = row.terms.currency.clone().unwrap_or_else(|| currency.clone());
            let amount = if row_currency == currency {
                row.clamp(raw)
            } else {
                let mut amount = raw;
                if let Some(min) = row.min_amt {
                    let (min, missed) = fx.convert(min, &row_currency).await?;
                    fees_confidence = degrade(fees_confidence, missed);
                    amount = amount.max(min);
                }
                if let Some(max) = row.max_amt {
                    let (max, missed) = fx.convert(max, &row_currency).await?;
                    fees_confidence = degrade(fees_confidence, missed);
                    amount = amount.min(max);
                }
                amount
            };

            surcharges.push(SurchargeLine {
                code: row.code.clone(),
                amount: Money::new(currency.round(amount), currency.clone()),
            });
        }
        let fees: Decimal = surcharges.iter().map(|s| s.amount.amount).sum();

        // Checkout VAT
        let checkout_vat_applied =
            de_minimis.suppress_vat && self.config.checkout_vat_applies(&lane.dest, request.incoterm);
        let checkout_vat = checkout_vat_applied
            .then(|| Money::new(currency.round(item_value * vat.rate_pct / HUNDRED), currency.clone()));

        let components = QuoteComponents {
            cif: Money::new(currency.round(cif), currency.clone()),
            duty: Money::new(currency.round(duty), currency.clone()),
            vat: Money::new(currency.round(vat_amount), currency.clone()),
            fees: Money::new(fees, currency.clone()),
            checkout_vat,
        };

        let component_confidence = ComponentConfidence {
            cif: cif_confidence,
            freight: freight_confidence,
            duty: duty_confidence,
            vat: vat.confidence,
            fees: fees_confidence,
            de_minimis: de_minimis.confidence,
        };
        let confidence = component_confidence.overall();
        let buffer_pct = self.config.buffer_pct(confidence);

        let total = components.total();
        let guaranteed_max = currency.round(total * (HUNDRED + buffer_pct) / HUNDRED);
        let missing_rates = fx.into_missing();

        if !missing_rates.is_empty() {
            warn!(pairs = ?missing_rates, "Quote has unresolved FX pairs");
        }
        info!(
            hs6 = %hs6,
            total = %total,
            currency = %currency,
            confidence = %confidence,
            "Quote computed"
        );

        Ok(Quote {
            hs6,
            currency: currency.clone(),
            incoterm: request.incoterm,
            on,
            chargeable_kg: basis.chargeable_kg,
            freight: Money::new(currency.round(freight_amount), currency.clone()),
            de_minimis,
            components,
            surcharges,
            total: Money::new(total, currency.clone()),
            guaranteed_max: Money::new(guaranteed_max, currency),
            confidence,
            component_confidence,
            missing_rates,
            policy: QuotePolicy {
                hs6_source,
                duty_preference,
                duty_rate_pct,
                vat_rate_pct: vat.rate_pct,
                vat_kind: vat.kind,
                vat_base: vat.base,
                vat_source: vat.source,
                freight_source,
                insurance_pct: self.config.insurance_pct,
                buffer_pct,
                strict_fx: self.config.strict_fx,
                checkout_vat_applied,
            },
        })
    }

    /// Explicit HS6, else the classifier; failure here is the one fatal path.
    async fn resolve_hs6(&self, item: &ShipmentItem) -> QuoteResult<(Hs6, Hs6Source)> {
        if let Some(hs6) = &item.hs6 {
            return Ok((hs6.clone(), Hs6Source::Explicit));
        }

        match self.classifier.classify(item).await {
            Ok(Some(found)) => {
                debug!(hs6 = %found.hs6, source = %found.source, "Classified item");
                Ok((found.hs6, Hs6Source::Classifier(found.source)))
            }
            Ok(None) => Err(QuoteError::ClassificationFailed(item.category_key.clone())),
            Err(e) => {
                warn!(category = %item.category_key, error = %e, "Classifier failed");
                Err(QuoteError::ClassificationFailed(item.category_key.clone()))
            }
        }
    }

    /// `base × pct + fixed` for a row's terms, in the settlement currency.
    ///
    /// `None` when the row's rate type cannot be determined.
    async fn terms_amount(
        &self,
        terms: &RateTerms,
        scope: &str,
        base: Decimal,
        item: &ShipmentItem,
        fx: &mut SettlementConverter<'_>,
    ) -> QuoteResult<Option<(Decimal, bool)>> {
        let parts = terms
            .percentage_of(base, scope)
            .and_then(|pct| terms.fixed_for(item, scope).map(|fixed| (pct, fixed)));
        let (pct, fixed) = match parts {
            Ok(parts) => parts,
            Err(e) => {
                warn!(scope = %scope, error = %e, "Skipping unusable rate row");
                return Ok(None);
            }
        };

        if fixed.is_zero() {
            return Ok(Some((pct, false)));
        }
        let fixed_currency = terms.currency.clone().unwrap_or_else(|| fx.currency().clone());
        let (fixed, missed) = fx.convert(fixed, &fixed_currency).await?;
        Ok(Some((pct + fixed, missed)))
    }
}

fn degrade(level: ConfidenceLevel, missed: bool) -> ConfidenceLevel {
    if missed {
        ConfidenceLevel::Missing
    } else {
        level
    }
}
