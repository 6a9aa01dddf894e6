//! HS6 classification seam.

use std::collections::HashMap;

use async_trait::async_trait;
use dashmap::DashMap;
use landed_common::{Hs6, ShipmentItem};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::QuoteResult;

/// A classifier's answer for an item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub hs6: Hs6,
    /// Name of the classifier that produced it.
    pub source: String,
}

/// Resolves an HS6 code for items that arrive without one.
#[async_trait]
pub trait Classifier: Send + Sync {
    /// Classify an item; `None` when no code can be determined.
    async fn classify(&self, item: &ShipmentItem) -> QuoteResult<Option<Classification>>;
}

/// Classifier backed by a fixed `category_key -> HS6` table.
#[derive(Default)]
pub struct CategoryClassifier {
    categories: DashMap<String, Hs6>,
}

impl CategoryClassifier {
    /// Create an empty classifier.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a classifier from a category table.
    pub fn with_categories(categories: HashMap<String, Hs6>) -> Self {
        Self {
            categories: categories.into_iter().collect(),
        }
    }

    /// Map a category to an HS6 code.
    pub fn insert(&self, category_key: impl Into<String>, hs6: Hs6) {
        self.categories.insert(category_key.into(), hs6);
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

#[async_trait]
impl Classifier for CategoryClassifier {
    async fn classify(&self, item: &ShipmentItem) -> QuoteResult<Option<Classification>> {
        let found = self
            .categories
            .get(&item.category_key)
            .map(|entry| entry.value().clone());
        debug!(category = %item.category_key, found = found.is_some(), "Category lookup");

        Ok(found.map(|hs6| Classification {
            hs6,
            source: "category".to_string(),
        }))
    }
}
