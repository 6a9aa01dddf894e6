//! As-of resolution of versioned rate rows.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::NaiveDate;
use landed_common::{ConfidenceLevel, CountryCode, EffectiveWindow, Hs6, LookupStatus, TransportMode};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::error::RateError;
use crate::freight_card::{FreightRateCard, FreightUnit};
use crate::partner::PartnerToken;
use crate::reader::{RateReader, RateTable};
use crate::row::{DutyRate, DutyRule, SurchargeRate, VatKind, VatOverride, VatRate};
use crate::threshold::{DeMinimisKind, DeMinimisThreshold};

/// A row with a validity window.
pub trait Versioned {
    fn window(&self) -> &EffectiveWindow;

    /// Tie-break rank among rows sharing an `effective_from`; higher wins.
    fn specificity(&self) -> u8 {
        0
    }
}

impl Versioned for DutyRate {
    fn window(&self) -> &EffectiveWindow {
        &self.window
    }

    fn specificity(&self) -> u8 {
        if self.partner.is_some() {
            2
        } else {
            0
        }
    }
}

impl Versioned for VatRate {
    fn window(&self) -> &EffectiveWindow {
        &self.window
    }
}

impl Versioned for VatOverride {
    fn window(&self) -> &EffectiveWindow {
        &self.window
    }
}

impl Versioned for SurchargeRate {
    fn window(&self) -> &EffectiveWindow {
        &self.window
    }

    fn specificity(&self) -> u8 {
        2 * u8::from(self.origin.is_some()) + u8::from(self.hs6.is_some())
    }
}

impl Versioned for DeMinimisThreshold {
    fn window(&self) -> &EffectiveWindow {
        &self.window
    }
}

impl Versioned for FreightRateCard {
    fn window(&self) -> &EffectiveWindow {
        &self.window
    }
}

/// The single active row at `on`: latest `effective_from` among rows whose
/// window contains `on`, ties broken by [`Versioned::specificity`].
pub fn resolve_active<'a, T, I>(rows: I, on: NaiveDate) -> Option<&'a T>
where
    T: Versioned + 'a,
    I: IntoIterator<Item = &'a T>,
{
    resolve_active_by(rows, on, |row| row.specificity())
}

/// [`resolve_active`] with a caller-supplied specificity. On a full tie the
/// first row in input order is kept.
pub fn resolve_active_by<'a, T, I, F>(rows: I, on: NaiveDate, specificity: F) -> Option<&'a T>
where
    T: Versioned + 'a,
    I: IntoIterator<Item = &'a T>,
    F: Fn(&T) -> u8,
{
    let mut best: Option<(&'a T, (NaiveDate, u8))> = None;
    for row in rows {
        if !row.window().is_active_on(on) {
            continue;
        }
        let rank = (row.window().effective_from, specificity(row));
        match &best {
            Some((_, best_rank)) if *best_rank >= rank => {}
            _ => best = Some((row, rank)),
        }
    }
    best.map(|(row, _)| row)
}

/// Result of a table lookup: the active row, if any, and how it was found.
#[derive(Debug, Clone, PartialEq)]
pub struct Lookup<T> {
    pub status: LookupStatus,
    pub row: Option<T>,
}

impl<T> Lookup<T> {
    /// An active row was found.
    pub fn found(row: T) -> Self {
        Self {
            status: LookupStatus::Ok,
            row: Some(row),
        }
    }

    /// The table covers the scope but nothing is active.
    pub fn no_match() -> Self {
        Self {
            status: LookupStatus::NoMatch,
            row: None,
        }
    }

    /// `found` or `no_match` depending on `row`.
    pub fn from_option(row: Option<T>) -> Self {
        match row {
            Some(row) => Self::found(row),
            None => Self::no_match(),
        }
    }

    /// Map a reader error onto a degraded lookup.
    pub fn failed(table: RateTable, err: &RateError) -> Self {
        let status = match err {
            RateError::NoDataset(_) => LookupStatus::NoDataset,
            RateError::OutOfScope { .. } => LookupStatus::OutOfScope,
            _ => LookupStatus::Error,
        };
        warn!(table = %table, error = %err, status = ?status, "Rate lookup degraded");
        Self { status, row: None }
    }

    /// Confidence implied by the lookup status.
    pub fn confidence(&self) -> ConfidenceLevel {
        self.status.confidence()
    }

    /// Transform the row, keeping the status.
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Lookup<U> {
        Lookup {
            status: self.status,
            row: self.row.map(f),
        }
    }
}

/// How a duty row was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DutyPreference {
    /// Standard most-favoured-nation rate.
    Mfn,
    /// Preferential row whose partner column names the origin.
    PartnerColumn,
    /// Preferential row whose notes name the origin (approximate).
    PartnerNotes,
}

/// The active duty row and how it was matched.
#[derive(Debug, Clone, PartialEq)]
pub struct DutyMatch {
    pub rate: DutyRate,
    pub preference: DutyPreference,
}

/// Pick the duty row for an origin: structured preferential match, then a
/// preferential row naming the origin in its notes, then MFN.
pub fn select_duty(rows: &[DutyRate], origin: Option<&CountryCode>, on: NaiveDate) -> Option<DutyMatch> {
    let token = origin.and_then(|o| PartnerToken::new(o.as_str()));

    if let (Some(origin), Some(token)) = (origin, token.as_ref()) {
        let by_column = resolve_active(
            rows.iter()
                .filter(|r| r.rule == DutyRule::Fta && r.partner.as_ref() == Some(origin)),
            on,
        );
        if let Some(rate) = by_column {
            return Some(DutyMatch {
                rate: rate.clone(),
                preference: DutyPreference::PartnerColumn,
            });
        }

        let by_notes = resolve_active(
            rows.iter().filter(|r| {
                r.rule == DutyRule::Fta
                    && r.partner.is_none()
                    && r.notes.as_deref().map_or(false, |n| token.matches(n))
            }),
            on,
        );
        if let Some(rate) = by_notes {
            return Some(DutyMatch {
                rate: rate.clone(),
                preference: DutyPreference::PartnerNotes,
            });
        }
    }

    resolve_active(
        rows.iter()
            .filter(|r| r.rule == DutyRule::Mfn && r.partner.is_none()),
        on,
    )
    .map(|rate| DutyMatch {
        rate: rate.clone(),
        preference: DutyPreference::Mfn,
    })
}

/// Resolves active rows from a [`RateReader`], degrading instead of failing.
#[derive(Clone)]
pub struct TemporalResolver {
    reader: Arc<dyn RateReader>,
}

impl TemporalResolver {
    /// Create a resolver over a reader.
    pub fn new(reader: Arc<dyn RateReader>) -> Self {
        Self { reader }
    }

    /// Active duty for `(dest, hs6)`, preferring a preferential row for `origin`.
    #[instrument(skip(self), fields(dest = %dest, hs6 = %hs6))]
    pub async fn active_duty(
        &self,
        dest: &CountryCode,
        hs6: &Hs6,
        origin: Option<&CountryCode>,
        on: NaiveDate,
    ) -> Lookup<DutyMatch> {
        match self.reader.duty_rates(dest, hs6).await {
            Ok(rows) => {
                let selected = select_duty(&rows, origin, on);
                debug!(candidates = rows.len(), found = selected.is_some(), "Resolved duty");
                Lookup::from_option(selected)
            }
            Err(err) => Lookup::failed(RateTable::Duty, &err),
        }
    }

    /// Active VAT row per band for `dest`, ordered by band.
    pub async fn active_vat_rates(&self, dest: &CountryCode, on: NaiveDate) -> Lookup<Vec<VatRate>> {
        let rows = match self.reader.vat_rates(dest).await {
            Ok(rows) => rows,
            Err(err) => return Lookup::failed(RateTable::Vat, &err),
        };

        let mut by_kind: BTreeMap<VatKind, Vec<&VatRate>> = BTreeMap::new();
        for row in &rows {
            by_kind.entry(row.vat_kind).or_default().push(row);
        }
        let active: Vec<VatRate> = by_kind
            .into_values()
            .filter_map(|group| resolve_active(group, on).cloned())
            .collect();

        if active.is_empty() {
            Lookup::no_match()
        } else {
            Lookup::found(active)
        }
    }

    /// Active HS6-specific VAT override.
    pub async fn active_vat_override(
        &self,
        dest: &CountryCode,
        hs6: &Hs6,
        on: NaiveDate,
    ) -> Lookup<VatOverride> {
        match self.reader.vat_overrides(dest, hs6).await {
            Ok(rows) => Lookup::from_option(resolve_active(&rows, on).cloned()),
            Err(err) => Lookup::failed(RateTable::VatOverride, &err),
        }
    }

    /// Active surcharges applicable to an origin and HS6, one per scope key.
    pub async fn active_surcharges(
        &self,
        dest: &CountryCode,
        origin: &CountryCode,
        hs6: &Hs6,
        on: NaiveDate,
    ) -> Lookup<Vec<SurchargeRate>> {
        let rows = match self.reader.surcharges(dest).await {
            Ok(rows) => rows,
            Err(err) => return Lookup::failed(RateTable::Surcharge, &err),
        };

        let mut by_scope: BTreeMap<String, Vec<&SurchargeRate>> = BTreeMap::new();
        for row in rows.iter().filter(|r| r.applies_to(origin, hs6)) {
            by_scope.entry(row.scope_key()).or_default().push(row);
        }
        let active: Vec<SurchargeRate> = by_scope
            .into_values()
            .filter_map(|group| resolve_active(group, on).cloned())
            .collect();

        if active.is_empty() {
            Lookup::no_match()
        } else {
            Lookup::found(active)
        }
    }

    /// Active de-minimis threshold for `(dest, kind)`.
    pub async fn active_de_minimis(
        &self,
        dest: &CountryCode,
        kind: DeMinimisKind,
        on: NaiveDate,
    ) -> Lookup<DeMinimisThreshold> {
        match self.reader.de_minimis(dest, kind).await {
            Ok(rows) => Lookup::from_option(
                resolve_active(rows.iter().filter(|r| r.kind == kind), on).cloned(),
            ),
            Err(err) => Lookup::failed(RateTable::DeMinimis, &err),
        }
    }

    /// Active freight card for a lane and pricing unit.
    pub async fn active_freight_card(
        &self,
        origin: &CountryCode,
        dest: &CountryCode,
        mode: TransportMode,
        unit: FreightUnit,
        on: NaiveDate,
    ) -> Lookup<FreightRateCard> {
        match self.reader.freight_cards(origin, dest, mode).await {
            Ok(cards) => Lookup::from_option(
                resolve_active(cards.iter().filter(|c| c.unit == unit), on).cloned(),
            ),
            Err(err) => Lookup::failed(RateTable::FreightCard, &err),
        }
    }
}
