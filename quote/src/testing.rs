//! Shared rate fixture for orchestrator and pool tests.

use std::sync::Arc;

use chrono::NaiveDate;
use landed_common::{
    CountryCode, Currency, CurrencyPair, DimensionsCm, EffectiveWindow, FxRate, Hs6, Incoterm,
    Lane, Money, ShipmentItem, TransportMode,
};
use landed_fx::{FxEngine, FxEngineConfig, StaticRateSource, TtlFxCache};
use landed_rates::{
    DeMinimisBasis, DeMinimisKind, DeMinimisThreshold, DutyRate, DutyRule, FreightRateCard,
    FreightRateStep, FreightUnit, MemoryRateStore, RateTable, RateTerms, SurchargeRate,
    TemporalResolver, VatBase, VatKind, VatRate,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::classifier::CategoryClassifier;
use crate::config::QuoteConfig;
use crate::orchestrator::QuoteOrchestrator;
use crate::quote::QuoteRequest;

pub fn cc(code: &str) -> CountryCode {
    CountryCode::parse(code).unwrap()
}

pub fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn tshirt() -> Hs6 {
    Hs6::parse("610910").unwrap()
}

fn since(y: i32) -> EffectiveWindow {
    EffectiveWindow::starting(day(y, 1, 1))
}

fn duty(dest: &str, rule: DutyRule, pct: Decimal, notes: Option<&str>) -> DutyRate {
    DutyRate {
        dest: cc(dest),
        hs6: tshirt(),
        rule,
        partner: None,
        terms: RateTerms::ad_valorem(pct),
        window: since(2020),
        notes: notes.map(str::to_string),
    }
}

fn card(origin: &str, dest: &str, currency: Currency, price: Decimal, min: Decimal) -> FreightRateCard {
    FreightRateCard {
        origin: cc(origin),
        dest: cc(dest),
        mode: TransportMode::Air,
        unit: FreightUnit::Kg,
        currency,
        min_charge: Some(min),
        price_rounding: None,
        window: since(2024),
        steps: vec![
            FreightRateStep {
                upto_qty: dec!(10),
                price_per_unit: price,
            },
            FreightRateStep {
                upto_qty: dec!(100),
                price_per_unit: price - Decimal::ONE,
            },
        ],
    }
}

fn threshold(dest: &str, kind: DeMinimisKind, currency: Currency, value: Decimal) -> DeMinimisThreshold {
    DeMinimisThreshold {
        dest: cc(dest),
        kind,
        basis: DeMinimisBasis::Intrinsic,
        currency,
        value,
        window: EffectiveWindow::starting(day(2016, 3, 10)),
    }
}

/// US (no VAT, 800 USD duty de-minimis, MPF and a CN surcharge), GB (20 % VAT,
/// 135 GBP thresholds) and AU (10 % VAT on CIF, 800 USD duty de-minimis).
pub fn rate_store() -> Arc<MemoryRateStore> {
    let store = Arc::new(MemoryRateStore::new());

    store.insert_duty(duty("US", DutyRule::Mfn, dec!(12), None)).unwrap();
    store
        .insert_duty(duty("US", DutyRule::Fta, dec!(0), Some("Preferential tariff for IN goods")))
        .unwrap();
    store.insert_duty(duty("GB", DutyRule::Mfn, dec!(12), None)).unwrap();
    store.insert_duty(duty("AU", DutyRule::Mfn, dec!(5), None)).unwrap();

    store
        .insert_vat(VatRate {
            dest: cc("GB"),
            vat_kind: VatKind::Standard,
            rate_pct: dec!(20),
            base: VatBase::CifPlusDuty,
            window: since(2021),
        })
        .unwrap();
    store
        .insert_vat(VatRate {
            dest: cc("AU"),
            vat_kind: VatKind::Standard,
            rate_pct: dec!(10),
            base: VatBase::Cif,
            window: since(2021),
        })
        .unwrap();
    store.declare_coverage(RateTable::Vat, cc("US"));

    store
        .insert_surcharge(SurchargeRate {
            dest: cc("US"),
            code: "MPF".into(),
            origin: None,
            hs6: None,
            terms: RateTerms::ad_valorem(dec!(0.3464)),
            min_amt: Some(dec!(2.62)),
            max_amt: Some(dec!(528.33)),
            window: since(2024),
        })
        .unwrap();
    store
        .insert_surcharge(SurchargeRate {
            dest: cc("US"),
            code: "S301".into(),
            origin: Some(cc("CN")),
            hs6: None,
            terms: RateTerms::ad_valorem(dec!(25)),
            min_amt: None,
            max_amt: None,
            window: since(2024),
        })
        .unwrap();

    store
        .insert_threshold(threshold("US", DeMinimisKind::Duty, Currency::usd(), dec!(800)))
        .unwrap();
    store
        .insert_threshold(threshold("AU", DeMinimisKind::Duty, Currency::usd(), dec!(800)))
        .unwrap();
    store
        .insert_threshold(threshold("GB", DeMinimisKind::Duty, Currency::gbp(), dec!(135)))
        .unwrap();
    store
        .insert_threshold(threshold("GB", DeMinimisKind::Vat, Currency::gbp(), dec!(135)))
        .unwrap();

    store
        .insert_freight_card(card("CN", "US", Currency::usd(), dec!(8), dec!(15)))
        .unwrap();
    store
        .insert_freight_card(card("CN", "AU", Currency::usd(), dec!(9), dec!(20)))
        .unwrap();
    store
        .insert_freight_card(card("CN", "GB", Currency::gbp(), dec!(7), dec!(12)))
        .unwrap();

    store
}

pub fn fx_engine(rates: Vec<FxRate>) -> Arc<FxEngine> {
    Arc::new(FxEngine::new(
        Arc::new(StaticRateSource::with_rates(rates)),
        Arc::new(TtlFxCache::new()),
        FxEngineConfig::default(),
    ))
}

pub fn usd_eur(rate: Decimal) -> FxRate {
    FxRate::new(CurrencyPair::new(Currency::usd(), Currency::eur()), rate, None)
}

pub fn orchestrator_with(store: Arc<MemoryRateStore>, rates: Vec<FxRate>, config: QuoteConfig) -> QuoteOrchestrator {
    let classifier = CategoryClassifier::new();
    classifier.insert("tshirt", tshirt());
    QuoteOrchestrator::new(
        TemporalResolver::new(store),
        fx_engine(rates),
        Arc::new(classifier),
        config,
    )
}

pub fn orchestrator() -> QuoteOrchestrator {
    orchestrator_with(rate_store(), vec![], QuoteConfig::default())
}

/// A 30x20x5 cm, 0.5 kg line: 0.6 chargeable kg by air.
pub fn item(value: Money) -> ShipmentItem {
    ShipmentItem {
        hs6: Some(tshirt()),
        category_key: "tshirt".into(),
        item_value: value,
        dims_cm: DimensionsCm::new(dec!(30), dec!(20), dec!(5)),
        weight_kg: dec!(0.5),
        quantity: None,
        liters: None,
    }
}

pub fn request(origin: &str, dest: &str, value: Money, incoterm: Incoterm) -> QuoteRequest {
    QuoteRequest {
        item: item(value),
        lane: Lane::new(cc(origin), cc(dest), TransportMode::Air),
        on: Some(day(2024, 6, 1)),
        incoterm,
        currency: None,
    }
}

pub fn usd(amount: Decimal) -> Money {
    Money::new(amount, Currency::usd())
}
