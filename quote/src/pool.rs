//! Manifest pooling: one freight charge for many lines, allocated back to
//! each line before it is quoted.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::NaiveDate;
use futures::future::try_join_all;
use landed_common::{today, ConfidenceLevel, Currency, Incoterm, Lane, Money, ShipmentItem};
use landed_freight::{allocation_shares, ShipmentBasis};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::error::{QuoteError, QuoteResult};
use crate::orchestrator::{FreightInput, QuoteOrchestrator};
use crate::quote::{Quote, QuoteComponents, QuoteRequest};
use crate::snapshot::{Snapshot, SnapshotKind, SnapshotSink};

/// Measure used to split the pooled freight charge across lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Allocation {
    /// Chargeable kilograms.
    #[default]
    Chargeable,
    /// Cubic metres.
    Volumetric,
    /// Gross kilograms.
    Weight,
}

impl Allocation {
    fn measure(&self, basis: &ShipmentBasis) -> Decimal {
        match self {
            Allocation::Chargeable => basis.chargeable_kg,
            Allocation::Volumetric => basis.m3,
            Allocation::Weight => basis.actual_kg,
        }
    }
}

/// A manifest of lines shipped together on one lane.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolRequest {
    pub items: Vec<ShipmentItem>,
    pub lane: Lane,
    #[serde(default)]
    pub on: Option<NaiveDate>,
    pub incoterm: Incoterm,
    #[serde(default)]
    pub currency: Option<Currency>,
    #[serde(default)]
    pub allocation: Allocation,
    /// Price without persisting a snapshot.
    #[serde(default)]
    pub dry_run: bool,
}

/// One line of a pooled manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolItemResult {
    pub index: usize,
    pub basis: ShipmentBasis,
    /// Allocated freight, in the charge's currency.
    pub freight_share: Money,
    pub quote: Quote,
}

/// Manifest totals in the settlement currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolSummary {
    pub currency: Currency,
    pub item_count: usize,
    pub allocation: Allocation,
    pub pooled_basis: ShipmentBasis,
    pub freight: Money,
    pub components: QuoteComponents,
    pub total: Money,
    pub guaranteed_max: Money,
    pub confidence: ConfidenceLevel,
    #[serde(default)]
    pub missing_rates: Vec<String>,
}

/// A priced manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolResult {
    pub summary: PoolSummary,
    pub per_item: Vec<PoolItemResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot_id: Option<Uuid>,
}

/// Prices a manifest as a single freight shipment.
pub struct PoolAllocator {
    orchestrator: Arc<QuoteOrchestrator>,
    snapshots: Arc<dyn SnapshotSink>,
}

impl PoolAllocator {
    pub fn new(orchestrator: Arc<QuoteOrchestrator>, snapshots: Arc<dyn SnapshotSink>) -> Self {
        Self {
            orchestrator,
            snapshots,
        }
    }

    /// Price the pooled freight once, allocate it, then quote every line.
    #[instrument(skip(self, request), fields(lane = %request.lane, items = request.items.len()))]
    pub async fn compute_pool(&self, request: &PoolRequest) -> QuoteResult<PoolResult> {
        if request.items.is_empty() {
            return Err(QuoteError::EmptyManifest);
        }

        let on = request.on.unwrap_or_else(today);
        let currency = self.orchestrator.settlement_currency(request.currency.as_ref());

        let bases = request
            .items
            .iter()
            .map(ShipmentBasis::for_item)
            .collect::<Result<Vec<_>, _>>()?;
        let pooled_basis = ShipmentBasis::pooled(&bases);

        let lookup = self
            .orchestrator
            .freight()
            .price_basis(&request.lane, &pooled_basis, on)
            .await;
        let (charge, freight_confidence, priced) = match lookup.row {
            Some(charge) => (charge.amount, lookup.status.confidence(), true),
            None => {
                warn!(lane = %request.lane, "Pooling without freight");
                (Money::zero(currency.clone()), ConfidenceLevel::Missing, false)
            }
        };

        let measures: Vec<Decimal> = bases.iter().map(|b| request.allocation.measure(b)).collect();
        let shares = allocation_shares(&measures, &charge)?;

        let quotes = try_join_all(request.items.iter().zip(&shares).map(|(item, share)| {
            let quote_request = QuoteRequest {
                item: item.clone(),
                lane: request.lane.clone(),
                on: Some(on),
                incoterm: request.incoterm,
                currency: Some(currency.clone()),
            };
            let freight = if priced {
                FreightInput::Pooled {
                    amount: share.clone(),
                    confidence: freight_confidence,
                }
            } else {
                FreightInput::Unpriced
            };
            async move {
                self.orchestrator
                    .quote_with_freight(&quote_request, freight)
                    .await
            }
        }))
        .await?;

        let per_item: Vec<PoolItemResult> = quotes
            .into_iter()
            .zip(bases)
            .zip(shares)
            .enumerate()
            .map(|(index, ((quote, basis), freight_share))| PoolItemResult {
                index,
                basis,
                freight_share,
                quote,
            })
            .collect();

        let summary = self.summarize(request, &currency, pooled_basis, freight_confidence, &per_item);
        info!(
            items = summary.item_count,
            total = %summary.total,
            confidence = %summary.confidence,
            "Pool computed"
        );

        let mut result = PoolResult {
            summary,
            per_item,
            snapshot_id: None,
        };
        if !request.dry_run {
            let snapshot = Snapshot::capture(SnapshotKind::Pool, &result)?;
            result.snapshot_id = Some(self.snapshots.save(snapshot).await?);
        }
        Ok(result)
    }

    fn summarize(
        &self,
        request: &PoolRequest,
        currency: &Currency,
        pooled_basis: ShipmentBasis,
        freight_confidence: ConfidenceLevel,
        per_item: &[PoolItemResult],
    ) -> PoolSummary {
        let mut components = QuoteComponents::zero(currency);
        let mut freight = Decimal::ZERO;
        let mut missing = BTreeSet::new();
        for line in per_item {
            components.accumulate(&line.quote.components);
            freight += line.quote.freight.amount;
            missing.extend(line.quote.missing_rates.iter().cloned());
        }

        let confidence = ConfidenceLevel::overall(
            per_item
                .iter()
                .map(|line| line.quote.confidence)
                .chain(std::iter::once(freight_confidence)),
        );
        let buffer_pct = self.orchestrator.config().buffer_pct(confidence);
        let total = components.total();
        let guaranteed_max =
            currency.round(total * (Decimal::ONE_HUNDRED + buffer_pct) / Decimal::ONE_HUNDRED);

        PoolSummary {
            currency: currency.clone(),
            item_count: per_item.len(),
            allocation: request.allocation,
            pooled_basis,
            freight: Money::new(freight, currency.clone()),
            components,
            total: Money::new(total, currency.clone()),
            guaranteed_max: Money::new(guaranteed_max, currency.clone()),
            confidence,
            missing_rates: missing.into_iter().collect(),
        }
    }
}
