//! One scan: load or fetch a market snapshot, detect flips, persist the results.

use crate::{
    cache::{CacheEntry, JsonStore, LAST_FLIPS_KEY, SNAPSHOT_KEY},
    config::AppConfig,
    errors::Result,
    feeds::{
        ApiClient, AuctionRecord, BazaarResponse, ItemCatalog, NormalizeReport,
        component_price_book, normalize_bazaar, normalize_listings,
    },
    flips::{ComponentPriceBook, detect_flips, detect_flips_with_components},
    models::{FlipCandidate, FlipFilter, PriceObservation},
    utils,
};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Normalized observations from both feeds at one point in time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub listings: Vec<PriceObservation>,
    pub bazaar: Vec<PriceObservation>,
    #[serde(default)]
    pub component_prices: ComponentPriceBook,
}

impl MarketSnapshot {
    /// Normalize raw feed payloads. Excluded records are returned per feed.
    pub fn from_feeds(
        auctions: &[AuctionRecord],
        bazaar: &BazaarResponse,
        catalog: &ItemCatalog,
    ) -> (Self, Vec<NormalizeReport>) {
        let (listings, listing_report) = normalize_listings(auctions);
        let (bazaar_obs, bazaar_report) = normalize_bazaar(bazaar, catalog);
        let snapshot = Self {
            listings,
            bazaar: bazaar_obs,
            component_prices: component_price_book(bazaar),
        };
        (snapshot, vec![listing_report, bazaar_report])
    }

    /// Observations a scan looks at, listings first.
    pub fn observations(&self, include_bazaar: bool) -> impl Iterator<Item = &PriceObservation> {
        let bazaar: &[PriceObservation] = if include_bazaar { &self.bazaar } else { &[] };
        self.listings.iter().chain(bazaar)
    }

    /// All observations of one item, any source.
    pub fn item_observations(&self, item_key: &str) -> Vec<PriceObservation> {
        self.observations(true)
            .filter(|o| o.item_key().eq_ignore_ascii_case(item_key))
            .cloned()
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct ScanOptions {
    pub filter: FlipFilter,
    pub include_bazaar: bool,
    /// Ignore a fresh cached snapshot and fetch live data.
    pub refresh: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            filter: FlipFilter::default(),
            include_bazaar: true,
            refresh: false,
        }
    }
}

/// Rank flips over the whole snapshot, then keep the ones the filter asks for.
/// Enchantments are valued only when bazaar data is part of the scan.
pub fn detect(snapshot: &MarketSnapshot, options: &ScanOptions) -> Vec<FlipCandidate> {
    let observations: Vec<PriceObservation> =
        snapshot.observations(options.include_bazaar).cloned().collect();
    let flips = if options.include_bazaar {
        detect_flips_with_components(&observations, &snapshot.component_prices)
    } else {
        detect_flips(&observations)
    };
    flips
        .into_iter()
        .filter(|f| options.filter.matches(f))
        .collect()
}

#[derive(Debug, Clone)]
pub struct ScanOutcome {
    pub flips: Vec<FlipCandidate>,
    pub from_cache: bool,
    pub snapshot_age_secs: u64,
}

/// Runs scans against the live API and the local store.
pub struct Scanner {
    client: ApiClient,
    store: JsonStore,
    config: AppConfig,
}

impl Scanner {
    pub fn new(config: AppConfig) -> Result<Self> {
        let client = ApiClient::new(&config)?;
        let store = JsonStore::new(config.data_dir.clone());
        Ok(Self {
            client,
            store,
            config,
        })
    }

    pub fn store(&self) -> &JsonStore {
        &self.store
    }

    /// Fetch catalog, bazaar and every auction page, then normalize.
    ///
    /// Any transport or protocol failure aborts the whole fetch.
    pub async fn fetch_snapshot(&self) -> Result<MarketSnapshot> {
        let catalog = self.client.fetch_catalog().await?;
        let bazaar = self.client.fetch_bazaar().await?;
        let auctions = self.client.fetch_all_auctions(self.config.page_delay).await?;

        let (snapshot, reports) = MarketSnapshot::from_feeds(&auctions, &bazaar, &catalog);
        for report in &reports {
            report.log();
        }
        info!(
            auctions = auctions.len(),
            listings = snapshot.listings.len(),
            bazaar = snapshot.bazaar.len(),
            priced_components = snapshot.component_prices.len(),
            "[SCAN] snapshot normalized"
        );
        Ok(snapshot)
    }

    /// Use the cached snapshot while fresh; otherwise fetch and cache a new one.
    pub async fn snapshot(&self, refresh: bool) -> Result<(CacheEntry<MarketSnapshot>, bool)> {
        let now = utils::now_ms();
        if !refresh {
            let cached =
                self.store
                    .get_fresh::<MarketSnapshot>(SNAPSHOT_KEY, now, self.config.cache_ttl)?;
            if let Some(entry) = cached {
                info!(
                    age_secs = entry.age(now).as_secs(),
                    "[CACHE] using cached snapshot"
                );
                return Ok((entry, true));
            }
        }

        let snapshot = self.fetch_snapshot().await?;
        let entry = CacheEntry::new(utils::now_ms(), snapshot);
        self.store.put(SNAPSHOT_KEY, &entry)?;
        Ok((entry, false))
    }

    /// Detect flips on the current snapshot and persist them as the last result set.
    pub async fn scan(&self, options: &ScanOptions) -> Result<ScanOutcome> {
        let (entry, from_cache) = self.snapshot(options.refresh).await?;
        let flips = detect(&entry.payload, options);
        info!(
            flips = flips.len(),
            from_cache,
            filtered = !options.filter.is_empty(),
            "[SCAN] detection complete"
        );

        self.store
            .put(LAST_FLIPS_KEY, &CacheEntry::new(utils::now_ms(), flips.clone()))?;

        Ok(ScanOutcome {
            flips,
            from_cache,
            snapshot_age_secs: entry.age(utils::now_ms()).as_secs(),
        })
    }

    /// Results of the most recent scan, if any.
    pub fn last_flips(&self) -> Result<Option<CacheEntry<Vec<FlipCandidate>>>> {
        self.store.get(LAST_FLIPS_KEY)
    }
}
