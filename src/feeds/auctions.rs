use super::NormalizeReport;
use super::client::{ApiClient, Envelope};
use crate::errors::{DataError, Result};
use crate::flips::components::component_lines;
use crate::models::{PriceObservation, SourceKind};
use serde::Deserialize;
use std::future::Future;
use std::time::Duration;
use tracing::info;

const AUCTIONS_PATH: &str = "skyblock/auctions";

/// One page of the active auctions feed.
#[derive(Debug, Deserialize)]
pub struct AuctionPage {
    pub success: bool,
    #[serde(default)]
    pub cause: Option<String>,
    #[serde(rename = "totalPages", default)]
    pub total_pages: u32,
    #[serde(default)]
    pub auctions: Vec<AuctionRecord>,
}

impl Envelope for AuctionPage {
    fn success(&self) -> bool {
        self.success
    }
    fn cause(&self) -> Option<&str> {
        self.cause.as_deref()
    }
}

/// One auction as sent upstream. Per-record fields decode leniently so a single bad
/// record is dropped during normalization instead of failing its page.
#[derive(Debug, Clone, Deserialize)]
pub struct AuctionRecord {
    #[serde(default, deserialize_with = "super::lenient")]
    pub uuid: Option<String>,
    #[serde(default, deserialize_with = "super::lenient")]
    pub auctioneer: Option<String>,
    #[serde(default, deserialize_with = "super::lenient")]
    pub item_name: Option<String>,
    #[serde(default, deserialize_with = "super::lenient")]
    pub item_lore: String,
    #[serde(default, deserialize_with = "super::lenient")]
    pub tier: Option<String>,
    #[serde(default, deserialize_with = "super::lenient")]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "super::lenient")]
    pub starting_bid: Option<f64>,
    #[serde(default, deserialize_with = "super::lenient")]
    pub bin: bool,
    #[serde(default, deserialize_with = "super::lenient")]
    pub soulbound: bool,
}

impl AuctionRecord {
    pub fn is_soulbound(&self) -> bool {
        self.soulbound || self.item_lore.contains("Soulbound")
    }
}

/// Progress after each fetched page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageProgress {
    /// Pages fetched so far.
    pub page: u32,
    pub total_pages: u32,
    /// Records accumulated so far.
    pub records: usize,
}

/// Fetch every page sequentially, starting at page 0.
///
/// The page count is taken from each response and the loop stops once it is reached.
/// `delay` is slept between pages. The first failing page aborts the whole fetch.
pub async fn fetch_pages<F, Fut>(
    mut fetch_page: F,
    delay: Duration,
    mut on_progress: impl FnMut(PageProgress),
) -> Result<Vec<AuctionRecord>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<AuctionPage>>,
{
    let mut records = Vec::new();
    let mut page = 0u32;
    let mut total_pages = 1u32;

    while page < total_pages {
        let body = fetch_page(page).await?;
        total_pages = body.total_pages;
        records.extend(body.auctions);
        page += 1;
        on_progress(PageProgress {
            page,
            total_pages,
            records: records.len(),
        });
        if page < total_pages && !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    Ok(records)
}

impl ApiClient {
    pub async fn fetch_auction_page(&self, page: u32) -> Result<AuctionPage> {
        self.get_json(AUCTIONS_PATH, &[("page", page.to_string())])
            .await
    }

    /// Fetch all active auctions, logging progress as pages arrive.
    pub async fn fetch_all_auctions(&self, delay: Duration) -> Result<Vec<AuctionRecord>> {
        fetch_pages(
            |page| self.fetch_auction_page(page),
            delay,
            |p| {
                info!(
                    page = p.page,
                    total = p.total_pages,
                    records = p.records,
                    "[FETCH] auction page"
                )
            },
        )
        .await
    }
}

/// Turn BIN, tradable listings into `ListingPrice` observations.
pub fn normalize_listings(records: &[AuctionRecord]) -> (Vec<PriceObservation>, NormalizeReport) {
    let mut report = NormalizeReport::new("auctions");
    let mut observations = Vec::new();

    for record in records.iter().filter(|r| r.bin && !r.is_soulbound()) {
        report.considered += 1;
        let name = record.item_name.as_deref().unwrap_or_default().trim();
        let Some(price) = record.starting_bid else {
            report.dropped.push(DataError::MissingField {
                item_key: name.to_string(),
                field: "starting_bid",
            });
            continue;
        };
        match PriceObservation::new(name, price, SourceKind::ListingPrice) {
            Ok(obs) => observations.push(
                obs.with_metadata(component_lines(&record.item_lore))
                    .with_attributes(record.category.clone(), record.tier.clone()),
            ),
            Err(e) => report.dropped.push(e),
        }
    }

    (observations, report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::AppError;
    use std::cell::RefCell;

    fn record(name: &str, bid: f64, bin: bool, lore: &str) -> AuctionRecord {
        AuctionRecord {
            uuid: None,
            auctioneer: None,
            item_name: Some(name.to_string()),
            item_lore: lore.to_string(),
            tier: Some("LEGENDARY".into()),
            category: Some("weapon".into()),
            starting_bid: Some(bid),
            bin,
            soulbound: false,
        }
    }

    fn page(total_pages: u32, names: &[&str]) -> AuctionPage {
        AuctionPage {
            success: true,
            cause: None,
            total_pages,
            auctions: names.iter().map(|n| record(n, 1.0, true, "")).collect(),
        }
    }

    #[test]
    fn parses_auction_page_shape() {
        let raw = r#"{
            "success": true,
            "page": 0,
            "totalPages": 3,
            "totalAuctions": 2,
            "auctions": [
                {"uuid": "a1", "auctioneer": "p1", "item_name": "Hyperion", "item_lore": "§9Smite VII",
                 "tier": "LEGENDARY", "category": "weapon", "starting_bid": 900000000, "bin": true},
                {"item_name": "Dirt", "starting_bid": 1.5}
            ]
        }"#;
        let parsed: AuctionPage = serde_json::from_str(raw).expect("json should parse");
        assert_eq!(parsed.total_pages, 3);
        assert_eq!(parsed.auctions.len(), 2);
        assert!(parsed.auctions[0].bin);
        assert!(!parsed.auctions[1].bin);
        assert_eq!(parsed.auctions[1].item_lore, "");
    }

    #[test]
    fn normalize_keeps_bin_tradable_listings() {
        let records = vec![
            record("Hyperion", 100.0, true, "§9Sharpness V"),
            record("Hyperion", 90.0, false, ""),
            record("Bound Sword", 10.0, true, "§8§lSoulbound"),
            record("Broken", -3.0, true, ""),
        ];
        let (obs, report) = normalize_listings(&records);
        assert_eq!(obs.len(), 1);
        assert_eq!(obs[0].item_key(), "Hyperion");
        assert_eq!(obs[0].price(), 100.0);
        assert_eq!(obs[0].source(), SourceKind::ListingPrice);
        assert_eq!(obs[0].metadata(), Some("Sharpness V"));
        assert_eq!(obs[0].rarity(), Some("LEGENDARY"));
        assert_eq!(report.considered, 2);
        assert_eq!(
            report.dropped,
            vec![DataError::InvalidPrice {
                item_key: "Broken".into(),
                price: -3.0
            }]
        );
    }

    #[test]
    fn malformed_record_is_dropped_not_fatal() {
        let raw = r#"{"success": true, "totalPages": 1, "auctions": [
            {"item_name": "Good", "starting_bid": 100, "bin": true},
            {"item_name": "Bad", "starting_bid": null, "bin": true},
            {"item_name": "Worse", "starting_bid": "lots", "bin": true},
            {"item_name": 7, "starting_bid": 5, "bin": true}
        ]}"#;
        let parsed: AuctionPage = serde_json::from_str(raw).expect("page should still parse");
        assert_eq!(parsed.auctions.len(), 4);

        let (obs, report) = normalize_listings(&parsed.auctions);
        assert_eq!(obs.len(), 1);
        assert_eq!(obs[0].item_key(), "Good");
        assert_eq!(obs[0].price(), 100.0);
        assert_eq!(report.considered, 4);
        assert_eq!(
            report.dropped,
            vec![
                DataError::MissingField {
                    item_key: "Bad".into(),
                    field: "starting_bid"
                },
                DataError::MissingField {
                    item_key: "Worse".into(),
                    field: "starting_bid"
                },
                DataError::EmptyItemKey,
            ]
        );
    }

    #[test]
    fn soulbound_flag_excludes_listing() {
        let mut r = record("Pet", 5.0, true, "");
        r.soulbound = true;
        let (obs, report) = normalize_listings(&[r]);
        assert!(obs.is_empty());
        assert_eq!(report.considered, 0);
    }

    #[tokio::test]
    async fn fetch_pages_stops_at_reported_total() {
        let requested = RefCell::new(Vec::new());
        let mut progress = Vec::new();
        let records = fetch_pages(
            |n| {
                requested.borrow_mut().push(n);
                async move { Ok::<_, AppError>(page(3, &["x", "y"])) }
            },
            Duration::ZERO,
            |p| progress.push(p),
        )
        .await
        .unwrap();

        assert_eq!(records.len(), 6);
        assert_eq!(*requested.borrow(), vec![0, 1, 2]);
        assert_eq!(
            progress.last(),
            Some(&PageProgress {
                page: 3,
                total_pages: 3,
                records: 6
            })
        );
    }

    #[tokio::test]
    async fn fetch_pages_aborts_on_first_failure() {
        let requested = RefCell::new(Vec::new());
        let result = fetch_pages(
            |n| {
                requested.borrow_mut().push(n);
                async move {
                    if n == 1 {
                        Err(AppError::Protocol("page 1 failed".into()))
                    } else {
                        Ok::<_, AppError>(page(5, &["x"]))
                    }
                }
            },
            Duration::ZERO,
            |_| {},
        )
        .await;

        assert!(matches!(result, Err(AppError::Protocol(_))));
        assert_eq!(*requested.borrow(), vec![0, 1]);
    }

    #[tokio::test]
    async fn empty_feed_fetches_single_page() {
        let records = fetch_pages(
            |_| async { Ok::<_, AppError>(page(0, &[])) },
            Duration::from_millis(1),
            |_| {},
        )
        .await
        .unwrap();
        assert!(records.is_empty());
    }
}
