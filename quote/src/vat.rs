//! VAT rate selection with HS6 overrides.

use chrono::NaiveDate;
use landed_common::{ConfidenceLevel, CountryCode, Hs6, LookupStatus};
use landed_rates::{TemporalResolver, VatBase, VatKind, VatRate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Where the applied VAT rate came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VatSource {
    /// Explicit rate on an HS6 override.
    Override,
    /// The destination's rate for the band an override names.
    OverrideKind,
    /// The destination's standard rate.
    Standard,
    /// No active rate.
    None,
}

/// The VAT rate applied to a quote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VatSelection {
    pub rate_pct: Decimal,
    pub kind: VatKind,
    pub base: VatBase,
    pub source: VatSource,
    pub confidence: ConfidenceLevel,
}

/// Resolve the VAT rate for `(dest, hs6)` on `on`.
///
/// Precedence: override `rate_pct`, then the destination's active rate for the
/// override's `vat_kind`, then the standard rate.
pub async fn resolve_vat(
    resolver: &TemporalResolver,
    dest: &CountryCode,
    hs6: &Hs6,
    on: NaiveDate,
) -> VatSelection {
    let rates = resolver.active_vat_rates(dest, on).await;
    let override_lookup = resolver.active_vat_override(dest, hs6, on).await;

    let table_confidence = rates.confidence();
    let override_confidence = override_lookup.confidence();
    let rows: Vec<VatRate> = rates.row.unwrap_or_default();
    let band = |kind: VatKind| rows.iter().find(|r| r.vat_kind == kind);
    let standard = band(VatKind::Standard);
    let base = standard.map(|r| r.base).unwrap_or_default();

    let explicit = override_lookup
        .row
        .as_ref()
        .and_then(|ov| ov.rate_pct.map(|pct| (pct, ov.vat_kind.unwrap_or_default())));
    let banded = override_lookup
        .row
        .as_ref()
        .and_then(|ov| ov.vat_kind)
        .and_then(band);
    let combined = table_confidence.min(override_confidence);
    // an unloaded override table means no override; a failed read may hide one
    let fallback = if override_lookup.status == LookupStatus::Error {
        combined
    } else {
        table_confidence
    };

    let selection = if let Some((rate_pct, kind)) = explicit {
        VatSelection {
            rate_pct,
            kind,
            base,
            source: VatSource::Override,
            confidence: override_confidence,
        }
    } else if let Some(row) = banded {
        VatSelection {
            rate_pct: row.rate_pct,
            kind: row.vat_kind,
            base: row.base,
            source: VatSource::OverrideKind,
            confidence: combined,
        }
    } else if let Some(row) = standard {
        VatSelection {
            rate_pct: row.rate_pct,
            kind: VatKind::Standard,
            base: row.base,
            source: VatSource::Standard,
            confidence: fallback,
        }
    } else {
        VatSelection {
            rate_pct: Decimal::ZERO,
            kind: VatKind::Standard,
            base,
            source: VatSource::None,
            confidence: fallback,
        }
    };

    debug!(
        dest = %dest,
        hs6 = %hs6,
        rate_pct = %selection.rate_pct,
        source = ?selection.source,
        "Resolved VAT"
    );
    selection
}
