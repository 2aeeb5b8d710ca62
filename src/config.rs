//! Configuration loader and application settings.

use crate::errors::{AppError, Result};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use url::Url;

pub const DEFAULT_API_BASE: &str = "https://api.hypixel.net/v2";

/// Consolidated application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Versioned API root, always ending in `/`.
    pub api_base: Url,
    /// Sent as the `API-Key` header when present.
    pub api_key: Option<String>,
    /// Pause between consecutive auction pages.
    pub page_delay: Duration,
    /// How long a cached auction snapshot stays fresh.
    pub cache_ttl: Duration,
    pub http_timeout_secs: u64,
    /// Directory holding the snapshot cache and the last results.
    pub data_dir: PathBuf,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset keys fall back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let mut base = var("HYPIXEL_API_BASE").unwrap_or_else(|| DEFAULT_API_BASE.into());
        if !base.ends_with('/') {
            base.push('/');
        }
        let api_base = Url::parse(&base)
            .map_err(|e| AppError::Config(format!("HYPIXEL_API_BASE {:?}: {}", base, e)))?;

        let page_delay_ms: u64 = parse_var(&var, "PAGE_DELAY_MS", 100)?;
        let cache_ttl_secs: u64 = parse_var(&var, "CACHE_TTL_SECS", 600)?;
        let http_timeout_secs: u64 = parse_var(&var, "HTTP_TIMEOUT_SECS", 30)?;

        Ok(Self {
            api_base,
            api_key: var("HYPIXEL_API_KEY"),
            page_delay: Duration::from_millis(page_delay_ms),
            cache_ttl: Duration::from_secs(cache_ttl_secs),
            http_timeout_secs,
            data_dir: var("DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(".skyblock-flipper")),
        })
    }
}

fn parse_var<T: FromStr>(
    var: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    match var(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| AppError::Config(format!("{} must be a number: {}", key, e))),
        None => Ok(default),
    }
}
