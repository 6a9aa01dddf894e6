//! De-minimis evaluation.

use std::sync::Arc;

use chrono::NaiveDate;
use landed_common::{ConfidenceLevel, CountryCode, Money};
use landed_fx::FxEngine;
use landed_rates::{DeMinimisBasis, DeMinimisKind, DeMinimisThreshold, TemporalResolver};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Shipment values a threshold can be compared against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeMinimisValues {
    /// Goods value only.
    pub intrinsic: Money,
    /// Goods plus freight plus insurance.
    pub cif: Money,
}

impl DeMinimisValues {
    fn for_basis(&self, basis: DeMinimisBasis) -> &Money {
        match basis {
            DeMinimisBasis::Intrinsic => &self.intrinsic,
            DeMinimisBasis::Cif => &self.cif,
        }
    }
}

/// Outcome of evaluating both thresholds for a destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeMinimisOutcome {
    /// Active duty threshold, if any.
    pub duty: Option<DeMinimisThreshold>,
    /// Active VAT threshold, if any.
    pub vat: Option<DeMinimisThreshold>,
    pub suppress_duty: bool,
    pub suppress_vat: bool,
    /// Pairs that could not be converted into a threshold currency.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub missing_rates: Vec<String>,
    /// Worst of the threshold lookups and conversions.
    pub confidence: ConfidenceLevel,
}

/// Evaluates duty and VAT de-minimis thresholds independently.
#[derive(Clone)]
pub struct DeMinimisEvaluator {
    resolver: TemporalResolver,
    fx: Arc<FxEngine>,
}

impl DeMinimisEvaluator {
    /// Create an evaluator.
    pub fn new(resolver: TemporalResolver, fx: Arc<FxEngine>) -> Self {
        Self { resolver, fx }
    }

    /// Evaluate both kinds for `dest` on `on`.
    pub async fn evaluate(
        &self,
        dest: &CountryCode,
        on: NaiveDate,
        values: &DeMinimisValues,
    ) -> DeMinimisOutcome {
        let duty = self.evaluate_kind(dest, DeMinimisKind::Duty, on, values).await;
        let vat = self.evaluate_kind(dest, DeMinimisKind::Vat, on, values).await;

        let mut missing_rates: Vec<String> = duty.missing.into_iter().chain(vat.missing).collect();
        missing_rates.sort();
        missing_rates.dedup();

        DeMinimisOutcome {
            duty: duty.threshold,
            vat: vat.threshold,
            suppress_duty: duty.suppress,
            suppress_vat: vat.suppress,
            missing_rates,
            confidence: duty.confidence.min(vat.confidence),
        }
    }

    async fn evaluate_kind(
        &self,
        dest: &CountryCode,
        kind: DeMinimisKind,
        on: NaiveDate,
        values: &DeMinimisValues,
    ) -> KindOutcome {
        let lookup = self.resolver.active_de_minimis(dest, kind, on).await;
        let confidence = lookup.confidence();

        let Some(threshold) = lookup.row else {
            return KindOutcome {
                threshold: None,
                suppress: false,
                missing: None,
                confidence,
            };
        };

        let value = values.for_basis(threshold.basis);
        let converted = self
            .fx
            .convert(value.amount, &value.currency, &threshold.currency, Some(on), false)
            .await;

        match converted {
            Ok(c) if !c.missing_rate => {
                let suppress = threshold.is_under(c.amount);
                debug!(
                    kind = %kind,
                    value = %c.amount,
                    threshold = %threshold.value,
                    suppress,
                    "Evaluated de-minimis"
                );
                KindOutcome {
                    threshold: Some(threshold),
                    suppress,
                    missing: None,
                    confidence,
                }
            }
            _ => {
                let pair = format!("{}->{}", value.currency, threshold.currency);
                warn!(kind = %kind, pair = %pair, "Cannot compare against de-minimis threshold");
                KindOutcome {
                    threshold: Some(threshold),
                    suppress: false,
                    missing: Some(pair),
                    confidence: ConfidenceLevel::Missing,
                }
            }
        }
    }
}

struct KindOutcome {
    threshold: Option<DeMinimisThreshold>,
    suppress: bool,
    missing: Option<String>,
    confidence: ConfidenceLevel,
}
