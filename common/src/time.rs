//! Effective-dating utilities for versioned rate rows.

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Cache-key label used when no valuation date is given.
pub const LATEST_DAY_KEY: &str = "latest";

/// Today's date in UTC.
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Day label for keying per-day data: `YYYY-MM-DD`, or `latest`.
pub fn day_key(on: Option<NaiveDate>) -> String {
    match on {
        Some(day) => day.format("%Y-%m-%d").to_string(),
        None => LATEST_DAY_KEY.to_string(),
    }
}

/// Half-open validity window `[effective_from, effective_to)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EffectiveWindow {
    pub effective_from: NaiveDate,
    #[serde(default)]
    pub effective_to: Option<NaiveDate>,
}

impl EffectiveWindow {
    /// Create a window; `effective_to = None` means open-ended.
    pub fn new(effective_from: NaiveDate, effective_to: Option<NaiveDate>) -> Self {
        Self {
            effective_from,
            effective_to,
        }
    }

    /// Open-ended window starting at `effective_from`.
    pub fn starting(effective_from: NaiveDate) -> Self {
        Self::new(effective_from, None)
    }

    /// `effective_from <= on` and (`effective_to` is open or `> on`).
    pub fn is_active_on(&self, on: NaiveDate) -> bool {
        self.effective_from <= on && self.effective_to.map_or(true, |to| to > on)
    }

    /// A window whose end does not come after its start can never be active.
    pub fn is_well_formed(&self) -> bool {
        self.effective_to.map_or(true, |to| to > self.effective_from)
    }
}
