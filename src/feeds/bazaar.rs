use super::NormalizeReport;
use super::catalog::ItemCatalog;
use super::client::{ApiClient, Envelope};
use crate::errors::{DataError, Result};
use crate::flips::ComponentPriceBook;
use crate::models::{PriceObservation, SourceKind};
use serde::Deserialize;
use std::collections::HashMap;
use tracing::info;

const BAZAAR_PATH: &str = "skyblock/bazaar";

#[derive(Debug, Deserialize)]
pub struct BazaarResponse {
    pub success: bool,
    #[serde(default)]
    pub cause: Option<String>,
    #[serde(default)]
    pub products: HashMap<String, BazaarProduct>,
}

impl Envelope for BazaarResponse {
    fn success(&self) -> bool {
        self.success
    }
    fn cause(&self) -> Option<&str> {
        self.cause.as_deref()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BazaarProduct {
    #[serde(default)]
    pub buy_summary: Vec<OrderLevel>,
    #[serde(default)]
    pub sell_summary: Vec<OrderLevel>,
}

impl BazaarProduct {
    pub fn best_buy(&self) -> Option<&OrderLevel> {
        self.buy_summary.first()
    }

    pub fn best_sell(&self) -> Option<&OrderLevel> {
        self.sell_summary.first()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct OrderLevel {
    #[serde(default, deserialize_with = "super::lenient")]
    pub amount: f64,
    #[serde(rename = "pricePerUnit", default, deserialize_with = "super::lenient")]
    pub price_per_unit: Option<f64>,
    #[serde(default, deserialize_with = "super::lenient")]
    pub orders: u32,
}

impl BazaarResponse {
    /// Products in id order so every run sees the same sequence.
    fn sorted_products(&self) -> Vec<(&String, &BazaarProduct)> {
        let mut products: Vec<_> = self.products.iter().collect();
        products.sort_by(|a, b| a.0.cmp(b.0));
        products
    }
}

impl ApiClient {
    pub async fn fetch_bazaar(&self) -> Result<BazaarResponse> {
        let body: BazaarResponse = self.get_json(BAZAAR_PATH, &[]).await?;
        info!(products = body.products.len(), "[BAZAAR] products loaded");
        Ok(body)
    }
}

/// Emit up to two observations per product: best buy and best sell.
///
/// Product ids are joined to display names through `catalog`; unresolved products
/// contribute nothing and are recorded in the report.
pub fn normalize_bazaar(
    bazaar: &BazaarResponse,
    catalog: &ItemCatalog,
) -> (Vec<PriceObservation>, NormalizeReport) {
    let mut report = NormalizeReport::new("bazaar");
    let mut observations = Vec::new();

    for (product_id, product) in bazaar.sorted_products() {
        let levels = [
            (product.best_buy(), SourceKind::OrderBookBuy),
            (product.best_sell(), SourceKind::OrderBookSell),
        ];
        if levels.iter().all(|(level, _)| level.is_none()) {
            continue;
        }
        report.considered += 1;

        let Some(item) = catalog.resolve(product_id) else {
            report.dropped.push(DataError::MissingCatalogEntry {
                product_id: product_id.clone(),
            });
            continue;
        };

        for (level, source) in levels {
            let Some(level) = level else { continue };
            let Some(price) = level.price_per_unit else {
                report.dropped.push(DataError::MissingField {
                    item_key: item.name.clone(),
                    field: "pricePerUnit",
                });
                continue;
            };
            match PriceObservation::new(item.name.as_str(), price, source) {
                Ok(obs) => observations
                    .push(obs.with_attributes(item.category.clone(), item.tier.clone())),
                Err(e) => report.dropped.push(e),
            }
        }
    }

    (observations, report)
}

/// Best buy unit price per product id, for enchantment valuation.
pub fn component_price_book(bazaar: &BazaarResponse) -> ComponentPriceBook {
    let mut book = ComponentPriceBook::new();
    for (product_id, product) in &bazaar.products {
        let price = product.best_buy().and_then(|level| level.price_per_unit);
        if let Some(price) = price.filter(|p| p.is_finite() && *p >= 0.0) {
            book.insert(product_id.clone(), price);
        }
    }
    book
}
