//! In-memory rate tables.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use landed_common::{CountryCode, Hs6, TransportMode};
use parking_lot::RwLock;
use tracing::debug;

use crate::error::{RateError, RateResult};
use crate::freight_card::FreightRateCard;
use crate::reader::{RateReader, RateTable};
use crate::row::{DutyRate, RateRow, SurchargeRate, VatOverride, VatRate};
use crate::threshold::{DeMinimisKind, DeMinimisThreshold};

/// Which destinations a loaded table covers.
#[derive(Debug, Default)]
struct Coverage {
    all: bool,
    dests: HashSet<CountryCode>,
}

impl Coverage {
    fn covers(&self, dest: &CountryCode) -> bool {
        self.all || self.dests.contains(dest)
    }
}

/// Thread-safe in-memory implementation of [`RateReader`].
///
/// Duty and VAT tables cover exactly the destinations that have rows (plus any
/// declared with [`declare_coverage`](Self::declare_coverage)); a destination
/// with no rows at all is out of scope. The remaining tables cover every
/// destination once they hold at least one row.
#[derive(Default)]
pub struct MemoryRateStore {
    duty: RwLock<Vec<DutyRate>>,
    vat: RwLock<Vec<VatRate>>,
    vat_overrides: RwLock<Vec<VatOverride>>,
    surcharges: RwLock<Vec<SurchargeRate>>,
    de_minimis: RwLock<Vec<DeMinimisThreshold>>,
    freight_cards: RwLock<Vec<FreightRateCard>>,
    coverage: RwLock<HashMap<RateTable, Coverage>>,
}

impl MemoryRateStore {
    /// Create an empty store; every table starts unloaded.
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and append a rate row.
    pub fn insert(&self, row: RateRow) -> RateResult<()> {
        row.validate()?;
        match row {
            RateRow::Duty(r) => {
                self.mark_loaded(RateTable::Duty, &r.dest);
                self.duty.write().push(r);
            }
            RateRow::Vat(r) => {
                self.mark_loaded(RateTable::Vat, &r.dest);
                self.vat.write().push(r);
            }
            RateRow::VatOverride(r) => {
                self.mark_loaded(RateTable::VatOverride, &r.dest);
                self.vat_overrides.write().push(r);
            }
            RateRow::Surcharge(r) => {
                self.mark_loaded(RateTable::Surcharge, &r.dest);
                self.surcharges.write().push(r);
            }
        }
        Ok(())
    }

    pub fn insert_duty(&self, row: DutyRate) -> RateResult<()> {
        self.insert(RateRow::Duty(row))
    }

    pub fn insert_vat(&self, row: VatRate) -> RateResult<()> {
        self.insert(RateRow::Vat(row))
    }

    pub fn insert_vat_override(&self, row: VatOverride) -> RateResult<()> {
        self.insert(RateRow::VatOverride(row))
    }

    pub fn insert_surcharge(&self, row: SurchargeRate) -> RateResult<()> {
        self.insert(RateRow::Surcharge(row))
    }

    /// Append a de-minimis threshold.
    pub fn insert_threshold(&self, row: DeMinimisThreshold) -> RateResult<()> {
        if !row.window.is_well_formed() {
            return Err(RateError::InvalidRow {
                scope: row.scope_key(),
                reason: "effective_to must be after effective_from".to_string(),
            });
        }
        self.mark_loaded(RateTable::DeMinimis, &row.dest);
        self.de_minimis.write().push(row);
        Ok(())
    }

    /// Validate and append a freight card.
    pub fn insert_freight_card(&self, card: FreightRateCard) -> RateResult<()> {
        card.validate()?;
        self.mark_loaded(RateTable::FreightCard, &card.dest);
        self.freight_cards.write().push(card);
        Ok(())
    }

    /// Mark a destination as covered by a table even without rows, e.g. a
    /// country that levies no VAT.
    pub fn declare_coverage(&self, table: RateTable, dest: CountryCode) {
        self.coverage
            .write()
            .entry(table)
            .or_default()
            .dests
            .insert(dest);
    }

    /// Number of rows held per table.
    pub fn row_counts(&self) -> HashMap<RateTable, usize> {
        HashMap::from([
            (RateTable::Duty, self.duty.read().len()),
            (RateTable::Vat, self.vat.read().len()),
            (RateTable::VatOverride, self.vat_overrides.read().len()),
            (RateTable::Surcharge, self.surcharges.read().len()),
            (RateTable::DeMinimis, self.de_minimis.read().len()),
            (RateTable::FreightCard, self.freight_cards.read().len()),
        ])
    }

    fn mark_loaded(&self, table: RateTable, dest: &CountryCode) {
        let mut coverage = self.coverage.write();
        let entry = coverage.entry(table).or_default();
        match table {
            RateTable::Duty | RateTable::Vat => {
                entry.dests.insert(dest.clone());
            }
            _ => entry.all = true,
        }
    }

    fn check(&self, table: RateTable, dest: &CountryCode) -> RateResult<()> {
        let coverage = self.coverage.read();
        match coverage.get(&table) {
            None => Err(RateError::NoDataset(table)),
            Some(c) if c.covers(dest) => Ok(()),
            Some(_) => Err(RateError::OutOfScope {
                table,
                dest: dest.clone(),
            }),
        }
    }
}

#[async_trait]
impl RateReader for MemoryRateStore {
    async fn duty_rates(&self, dest: &CountryCode, hs6: &Hs6) -> RateResult<Vec<DutyRate>> {
        self.check(RateTable::Duty, dest)?;
        let rows: Vec<DutyRate> = self
            .duty
            .read()
            .iter()
            .filter(|r| &r.dest == dest && &r.hs6 == hs6)
            .cloned()
            .collect();
        debug!(dest = %dest, hs6 = %hs6, rows = rows.len(), "Duty candidates");
        Ok(rows)
    }

    async fn vat_rates(&self, dest: &CountryCode) -> RateResult<Vec<VatRate>> {
        self.check(RateTable::Vat, dest)?;
        Ok(self
            .vat
            .read()
            .iter()
            .filter(|r| &r.dest == dest)
            .cloned()
            .collect())
    }

    async fn vat_overrides(&self, dest: &CountryCode, hs6: &Hs6) -> RateResult<Vec<VatOverride>> {
        self.check(RateTable::VatOverride, dest)?;
        Ok(self
            .vat_overrides
            .read()
            .iter()
            .filter(|r| &r.dest == dest && &r.hs6 == hs6)
            .cloned()
            .collect())
    }

    async fn surcharges(&self, dest: &CountryCode) -> RateResult<Vec<SurchargeRate>> {
        self.check(RateTable::Surcharge, dest)?;
        Ok(self
            .surcharges
            .read()
            .iter()
            .filter(|r| &r.dest == dest)
            .cloned()
            .collect())
    }

    async fn de_minimis(
        &self,
        dest: &CountryCode,
        kind: DeMinimisKind,
    ) -> RateResult<Vec<DeMinimisThreshold>> {
        self.check(RateTable::DeMinimis, dest)?;
        Ok(self
            .de_minimis
            .read()
            .iter()
            .filter(|r| &r.dest == dest && r.kind == kind)
            .cloned()
            .collect())
    }

    async fn freight_cards(
        &self,
        origin: &CountryCode,
        dest: &CountryCode,
        mode: TransportMode,
    ) -> RateResult<Vec<FreightRateCard>> {
        self.check(RateTable::FreightCard, dest)?;
        Ok(self
            .freight_cards
            .read()
            .iter()
            .filter(|c| &c.origin == origin && &c.dest == dest && c.mode == mode)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row::{VatBase, VatKind};
    use chrono::NaiveDate;
    use landed_common::EffectiveWindow;
    use rust_decimal_macros::dec;

    fn cc(code: &str) -> CountryCode {
        CountryCode::parse(code).unwrap()
    }

    #[tokio::test]
    async fn test_unloaded_table_is_no_dataset() {
        let store = MemoryRateStore::new();
        let result = store.vat_rates(&cc("DE")).await;
        assert_eq!(result, Err(RateError::NoDataset(RateTable::Vat)));
    }

    #[tokio::test]
    async fn test_declared_coverage() {
        let store = MemoryRateStore::new();
        store
            .insert_vat(VatRate {
                dest: cc("DE"),
                vat_kind: VatKind::Standard,
                rate_pct: dec!(19),
                base: VatBase::CifPlusDuty,
                window: EffectiveWindow::starting(NaiveDate::from_ymd_opt(2021, 1, 1).unwrap()),
            })
            .unwrap();

        assert!(matches!(
            store.vat_rates(&cc("HK")).await,
            Err(RateError::OutOfScope { .. })
        ));

        store.declare_coverage(RateTable::Vat, cc("HK"));
        assert_eq!(store.vat_rates(&cc("HK")).await.unwrap(), vec![]);
        assert_eq!(store.vat_rates(&cc("DE")).await.unwrap().len(), 1);
        assert_eq!(store.row_counts()[&RateTable::Vat], 1);
    }

    #[test]
    fn test_insert_rejects_ambiguous_row() {
        let store = MemoryRateStore::new();
        let row: RateRow = serde_json::from_str(
            r#"{"kind":"duty","dest":"US","hs6":"610910","effective_from":"2024-01-01"}"#,
        )
        .unwrap();
        assert!(matches!(store.insert(row), Err(RateError::AmbiguousRateType(_))));
        assert_eq!(store.row_counts()[&RateTable::Duty], 0);
    }
}
