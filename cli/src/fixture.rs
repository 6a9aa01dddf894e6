//! JSON rate fixtures.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{bail, Context};
use landed_common::{CountryCode, FxRate, Hs6};
use landed_fx::StaticRateSource;
use landed_quote::CategoryClassifier;
use landed_rates::{
    DeMinimisThreshold, DutyRate, FreightRateCard, MemoryRateStore, RateTable, SurchargeRate,
    VatOverride, VatRate,
};
use serde::Deserialize;
use tracing::info;

/// A destination a table covers without rows, e.g. a country with no VAT.
#[derive(Debug, Clone, Deserialize)]
pub struct CoverageEntry {
    pub table: RateTable,
    pub dest: CountryCode,
}

/// Every table the engine reads, as loaded from one JSON document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Fixture {
    #[serde(default)]
    pub duty_rates: Vec<DutyRate>,
    #[serde(default)]
    pub vat_rates: Vec<VatRate>,
    #[serde(default)]
    pub vat_overrides: Vec<VatOverride>,
    #[serde(default)]
    pub surcharges: Vec<SurchargeRate>,
    #[serde(default)]
    pub de_minimis: Vec<DeMinimisThreshold>,
    #[serde(default)]
    pub freight_cards: Vec<FreightRateCard>,
    #[serde(default)]
    pub fx_rates: Vec<FxRate>,
    #[serde(default)]
    pub categories: HashMap<String, Hs6>,
    #[serde(default)]
    pub coverage: Vec<CoverageEntry>,
}

/// Engine inputs built from a fixture.
pub struct Loaded {
    pub store: MemoryRateStore,
    pub fx: StaticRateSource,
    pub classifier: CategoryClassifier,
}

impl Fixture {
    /// Read and parse a fixture file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading fixture {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("parsing fixture {}", path.display()))
    }

    pub fn from_json(text: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Validate and load every row.
    ///
    /// Unlike quoting, which degrades on missing data, loading refuses a
    /// fixture whose core tables are empty or whose rows are malformed.
    pub fn into_loaded(self) -> anyhow::Result<Loaded> {
        let required = [
            (RateTable::Duty, self.duty_rates.is_empty()),
            (RateTable::Vat, self.vat_rates.is_empty()),
            (RateTable::DeMinimis, self.de_minimis.is_empty()),
            (RateTable::FreightCard, self.freight_cards.is_empty()),
        ];
        for (table, empty) in required {
            if empty {
                bail!("fixture table {} is empty", table);
            }
        }

        let store = MemoryRateStore::new();
        for row in self.duty_rates {
            store.insert_duty(row)?;
        }
        for row in self.vat_rates {
            store.insert_vat(row)?;
        }
        for row in self.vat_overrides {
            store.insert_vat_override(row)?;
        }
        for row in self.surcharges {
            store.insert_surcharge(row)?;
        }
        for row in self.de_minimis {
            store.insert_threshold(row)?;
        }
        for card in self.freight_cards {
            store.insert_freight_card(card)?;
        }
        for entry in self.coverage {
            store.declare_coverage(entry.table, entry.dest);
        }

        for rate in &self.fx_rates {
            if !rate.is_usable() {
                bail!("unusable FX rate {} = {}", rate.pair, rate.rate);
            }
        }

        info!(
            rows = ?store.row_counts(),
            fx_rates = self.fx_rates.len(),
            categories = self.categories.len(),
            "Fixture loaded"
        );

        Ok(Loaded {
            store,
            fx: StaticRateSource::with_rates(self.fx_rates),
            classifier: CategoryClassifier::with_categories(self.categories),
        })
    }
}
