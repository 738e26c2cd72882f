//! Time-stamped cached payloads stored beside the app state.

use crate::storage::Storage;
use chrono::{Duration, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error};

pub const CACHE_PREFIX: &str = "cache_";

/// Envelope version of stored cache entries
pub const CACHE_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub data: Value,
    /// Epoch milliseconds at write time
    pub timestamp: i64,
}

impl CacheEntry {
    fn age(&self, now_ms: i64) -> Duration {
        Duration::milliseconds(now_ms - self.timestamp)
    }
}

#[derive(Debug, Clone)]
pub struct OfflineCache {
    storage: Storage,
    ttl: Duration,
    retention: Duration,
}

impl OfflineCache {
    /// `ttl` bounds freshness for reads, `retention` bounds how long entries survive housekeeping
    pub fn new(storage: Storage, ttl: Duration, retention: Duration) -> Self {
        Self {
            storage,
            ttl,
            retention,
        }
    }

    fn storage_key(key: &str) -> String {
        format!("{}{}", CACHE_PREFIX, key)
    }

    pub async fn set_cached<T: Serialize>(&self, key: &str, data: &T) {
        let data = match serde_json::to_value(data) {
            Ok(data) => data,
            Err(e) => {
                error!(key, error = %e, "Failed to serialize cache entry");
                return;
            }
        };
        let entry = CacheEntry {
            data,
            timestamp: Utc::now().timestamp_millis(),
        };
        self.storage
            .set_versioned(&Self::storage_key(key), CACHE_VERSION, &entry)
            .await;
    }

    /// Cached value for `key`, or `None` if absent, unreadable or stale
    pub async fn get_cached<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let entry: CacheEntry = self
            .storage
            .get_versioned(&Self::storage_key(key), CACHE_VERSION)
            .await?;
        if entry.age(Utc::now().timestamp_millis()) >= self.ttl {
            debug!(key, "Cache entry expired");
            return None;
        }
        serde_json::from_value(entry.data).ok()
    }

    /// Remove entries older than the retention window; returns how many were removed
    pub async fn clear_old_cache(&self) -> usize {
        let now_ms = Utc::now().timestamp_millis();
        let mut removed = 0;
        for key in self.storage.keys().await {
            if !key.starts_with(CACHE_PREFIX) {
                continue;
            }
            let Some(entry) = self
                .storage
                .get_versioned::<CacheEntry>(&key, CACHE_VERSION)
                .await
            else {
                continue;
            };
            if entry.age(now_ms) > self.retention {
                self.storage.remove(&key).await;
                removed += 1;
            }
        }
        debug!(removed, "Cleared old cache entries");
        removed
    }
}
