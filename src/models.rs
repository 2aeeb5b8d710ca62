//! Shared data structures used throughout the application.

use crate::errors::DataError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a price quote came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceKind {
    /// Buy-It-Now auction listing.
    ListingPrice,
    /// Best bazaar buy level.
    OrderBookBuy,
    /// Best bazaar sell level.
    OrderBookSell,
}

impl SourceKind {
    pub fn label(self) -> &'static str {
        match self {
            SourceKind::ListingPrice => "BIN",
            SourceKind::OrderBookBuy => "Bazaar Buy",
            SourceKind::OrderBookSell => "Bazaar Sell",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One price quote for one item from one source.
///
/// Fields are read-only once constructed; use [`PriceObservation::new`] to build one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceObservation {
    item_key: String,
    price: f64,
    source: SourceKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    metadata: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    rarity: Option<String>,
}

impl PriceObservation {
    /// Rejects empty keys and negative or non-finite prices.
    pub fn new(
        item_key: impl Into<String>,
        price: f64,
        source: SourceKind,
    ) -> Result<Self, DataError> {
        let item_key = item_key.into();
        if item_key.trim().is_empty() {
            return Err(DataError::EmptyItemKey);
        }
        if !price.is_finite() || price < 0.0 {
            return Err(DataError::InvalidPrice { item_key, price });
        }
        Ok(Self {
            item_key,
            price,
            source,
            metadata: None,
            category: None,
            rarity: None,
        })
    }

    pub fn with_metadata(mut self, metadata: Option<String>) -> Self {
        self.metadata = metadata.filter(|m| !m.trim().is_empty());
        self
    }

    pub fn with_attributes(mut self, category: Option<String>, rarity: Option<String>) -> Self {
        self.category = category;
        self.rarity = rarity;
        self
    }

    pub fn item_key(&self) -> &str {
        &self.item_key
    }

    pub fn price(&self) -> f64 {
        self.price
    }

    pub fn source(&self) -> SourceKind {
        self.source
    }

    pub fn metadata(&self) -> Option<&str> {
        self.metadata.as_deref()
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    pub fn rarity(&self) -> Option<&str> {
        self.rarity.as_deref()
    }

    /// Observations loaded from disk bypass `new`, so the detector re-checks this.
    pub fn is_valid(&self) -> bool {
        !self.item_key.trim().is_empty() && self.price.is_finite() && self.price >= 0.0
    }
}

/// Ranked flip result for a single item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlipCandidate {
    pub item_key: String,
    pub lowest_price: f64,
    pub second_lowest_price: f64,
    /// Always strictly positive.
    pub margin: f64,
    pub lowest_source: SourceKind,
    pub second_source: SourceKind,
    /// Summed order-book value of the lowest listing's enchantments, display only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rarity: Option<String>,
}

/// Narrows a run to the items a user asked about.
///
/// Applied to ranked flips, never to raw observations, so it cannot change an item's
/// prices or margin.
#[derive(Debug, Clone, Default)]
pub struct FlipFilter {
    /// Case-insensitive substring of the item name.
    pub search: Option<String>,
    pub category: Option<String>,
    pub rarity: Option<String>,
}

fn same_attribute(wanted: &Option<String>, actual: Option<&str>) -> bool {
    match wanted {
        Some(wanted) => actual.is_some_and(|a| a.eq_ignore_ascii_case(wanted)),
        None => true,
    }
}

impl FlipFilter {
    pub fn is_empty(&self) -> bool {
        self.search.is_none() && self.category.is_none() && self.rarity.is_none()
    }

    pub fn matches(&self, flip: &FlipCandidate) -> bool {
        if let Some(needle) = &self.search {
            if !flip
                .item_key
                .to_lowercase()
                .contains(&needle.to_lowercase())
            {
                return false;
            }
        }
        same_attribute(&self.category, flip.category.as_deref())
            && same_attribute(&self.rarity, flip.rarity.as_deref())
    }
}
