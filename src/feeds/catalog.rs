use super::client::{ApiClient, Envelope};
use crate::errors::Result;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{info, warn};

const ITEMS_PATH: &str = "resources/skyblock/items";

#[derive(Debug, Deserialize)]
pub struct CatalogResponse {
    pub success: bool,
    #[serde(default)]
    pub cause: Option<String>,
    #[serde(default)]
    pub items: Vec<CatalogItem>,
}

impl Envelope for CatalogResponse {
    fn success(&self) -> bool {
        self.success
    }
    fn cause(&self) -> Option<&str> {
        self.cause.as_deref()
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CatalogItem {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub tier: Option<String>,
}

/// Product id → catalog entry, built once per run.
#[derive(Debug, Clone, Default)]
pub struct ItemCatalog {
    by_id: HashMap<String, CatalogItem>,
    duplicate_names: usize,
}

impl ItemCatalog {
    pub fn from_items(items: Vec<CatalogItem>) -> Self {
        let mut seen_names: HashMap<String, usize> = HashMap::new();
        let mut by_id = HashMap::with_capacity(items.len());
        for item in items {
            *seen_names.entry(item.name.clone()).or_default() += 1;
            by_id.insert(item.id.clone(), item);
        }
        let duplicate_names = seen_names.values().filter(|&&n| n > 1).count();
        Self {
            by_id,
            duplicate_names,
        }
    }

    pub fn resolve(&self, product_id: &str) -> Option<&CatalogItem> {
        self.by_id.get(product_id)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Display names shared by more than one id; these join ambiguously with listings.
    pub fn duplicate_names(&self) -> usize {
        self.duplicate_names
    }
}

impl ApiClient {
    pub async fn fetch_catalog(&self) -> Result<ItemCatalog> {
        let body: CatalogResponse = self.get_json(ITEMS_PATH, &[]).await?;
        let catalog = ItemCatalog::from_items(body.items);
        info!(items = catalog.len(), "[CATALOG] item catalog loaded");
        if catalog.duplicate_names() > 0 {
            warn!(
                duplicates = catalog.duplicate_names(),
                "[CATALOG] display names shared by several item ids"
            );
        }
        Ok(catalog)
    }
}
