//! File-backed key/value store with time-boxed entries.
//!
//! Each key is one JSON file in the data directory holding a [`CacheEntry`].

use crate::errors::Result;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

/// Normalized observations from the last live fetch.
pub const SNAPSHOT_KEY: &str = "auction_snapshot";
/// Last computed flip results.
pub const LAST_FLIPS_KEY: &str = "last_flips";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    /// Milliseconds since the Unix epoch at write time.
    pub timestamp_ms: i64,
    pub payload: T,
}

impl<T> CacheEntry<T> {
    pub fn new(now_ms: i64, payload: T) -> Self {
        Self {
            timestamp_ms: now_ms,
            payload,
        }
    }

    /// An entry is expired once `ttl` has fully elapsed. Entries stamped in the future
    /// count as fresh.
    pub fn is_expired(&self, now_ms: i64, ttl: Duration) -> bool {
        let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
        now_ms.saturating_sub(self.timestamp_ms) >= ttl_ms
    }

    pub fn age(&self, now_ms: i64) -> Duration {
        let elapsed = now_ms.saturating_sub(self.timestamp_ms);
        Duration::from_millis(u64::try_from(elapsed).unwrap_or(0))
    }
}

#[derive(Debug, Clone)]
pub struct JsonStore {
    dir: PathBuf,
}

impl JsonStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    /// Read an entry. A missing file is `None`; an unreadable one is logged and treated
    /// as missing so a corrupt cache only costs a refetch.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<CacheEntry<T>>> {
        let path = self.path_for(key);
        let raw = match fs::read(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        match serde_json::from_slice(&raw) {
            Ok(entry) => Ok(Some(entry)),
            Err(e) => {
                warn!(key, error = %e, "[CACHE] discarding unreadable entry");
                Ok(None)
            }
        }
    }

    /// Read an entry only if it has not expired.
    pub fn get_fresh<T: DeserializeOwned>(
        &self,
        key: &str,
        now_ms: i64,
        ttl: Duration,
    ) -> Result<Option<CacheEntry<T>>> {
        Ok(self.get(key)?.filter(|entry: &CacheEntry<T>| {
            let expired = entry.is_expired(now_ms, ttl);
            if expired {
                debug!(key, age_secs = entry.age(now_ms).as_secs(), "[CACHE] entry expired");
            }
            !expired
        }))
    }

    /// Write through a temp file so readers never see a partial entry.
    pub fn put<T: Serialize>(&self, key: &str, entry: &CacheEntry<T>) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec(entry)?)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }
}
