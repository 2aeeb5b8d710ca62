//! Upstream marketplace feeds.
//!
//! Responsibilities:
//! • Fetch auction pages, bazaar products and the item catalog over HTTP.
//! • Normalize both price feeds into `PriceObservation`s keyed by display name.
//! • Count the records that had to be excluded instead of failing on them.

pub mod auctions;
pub mod bazaar;
pub mod catalog;
pub mod client;

use crate::errors::DataError;
use serde::{Deserialize, Deserializer, de::DeserializeOwned};
use tracing::warn;

pub use auctions::{AuctionPage, AuctionRecord, PageProgress, fetch_pages, normalize_listings};
pub use bazaar::{BazaarProduct, BazaarResponse, OrderLevel, component_price_book, normalize_bazaar};
pub use catalog::{CatalogItem, ItemCatalog};
pub use client::ApiClient;

/// Decode a per-record field, reading a wrong-typed value as the default.
///
/// Keeps one bad record from failing the page it arrived on; normalization then drops
/// and counts it.
pub(crate) fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

/// Records excluded while normalizing a feed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizeReport {
    pub feed: &'static str,
    /// Records that passed the feed's own filters (BIN, tradable, ...).
    pub considered: usize,
    pub dropped: Vec<DataError>,
}

impl NormalizeReport {
    pub fn new(feed: &'static str) -> Self {
        Self {
            feed,
            ..Default::default()
        }
    }

    pub fn missing_joins(&self) -> usize {
        self.dropped
            .iter()
            .filter(|e| matches!(e, DataError::MissingCatalogEntry { .. }))
            .count()
    }

    pub fn invalid_records(&self) -> usize {
        self.dropped.len() - self.missing_joins()
    }

    /// Emit one summary line when anything was dropped.
    pub fn log(&self) {
        if self.dropped.is_empty() {
            return;
        }
        let sample: Vec<String> = self.dropped.iter().take(5).map(ToString::to_string).collect();
        warn!(
            feed = self.feed,
            considered = self.considered,
            missing_joins = self.missing_joins(),
            invalid = self.invalid_records(),
            ?sample,
            "[DATA] records excluded during normalization"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_counts_by_kind() {
        let mut report = NormalizeReport::new("bazaar");
        report.dropped.push(DataError::MissingCatalogEntry {
            product_id: "FOO".into(),
        });
        report.dropped.push(DataError::EmptyItemKey);
        report.dropped.push(DataError::MissingField {
            item_key: "Hyperion".into(),
            field: "starting_bid",
        });
        report.dropped.push(DataError::MissingCatalogEntry {
            product_id: "BAR".into(),
        });
        assert_eq!(report.missing_joins(), 2);
        assert_eq!(report.invalid_records(), 2);
    }
}
