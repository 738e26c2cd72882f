use super::record::{decode, decode_value, encode, encode_value};
use super::{KeyValueStore, MemoryStore, Record, Result, StorageError};
use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, error, warn};

/// Shared handle over a [`KeyValueStore`].
///
/// Every failure is logged and degrades to "no data": reads return `None` or the
/// record default, writes become no-ops. Writes to one key are serialized through
/// a per-key async mutex, so a read-modify-write done with [`Storage::update`]
/// never loses a concurrent update to the same key.
#[derive(Clone)]
pub struct Storage {
    backend: Arc<dyn KeyValueStore>,
    locks: Arc<Mutex<HashMap<String, Arc<Mutex<()>>>>>,
}

impl fmt::Debug for Storage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Storage").finish_non_exhaustive()
    }
}

impl Storage {
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self {
            backend,
            locks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    async fn lock_key(&self, key: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            locks
                .entry(key.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }

    async fn read_raw(&self, key: &str) -> Option<String> {
        match self.backend.get(key).await {
            Ok(value) => value,
            Err(e) => {
                error!(key, error = %e, "Failed to read from storage");
                None
            }
        }
    }

    async fn write_raw(&self, key: &str, value: String) {
        if let Err(e) = self.backend.set(key, value).await {
            error!(key, error = %e, "Failed to write to storage");
        }
    }

    /// Read and deserialize the plain JSON value under `key`
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.read_raw(key).await?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(key, error = %e, "Discarding unreadable stored value");
                None
            }
        }
    }

    /// Serialize `value` as plain JSON and store it under `key`
    pub async fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) {
        let json = match serde_json::to_string(value) {
            Ok(json) => json,
            Err(e) => {
                error!(key, error = %e, "Failed to serialize value");
                return;
            }
        };
        let _guard = self.lock_key(key).await;
        self.write_raw(key, json).await;
    }

    pub async fn remove(&self, key: &str) {
        let _guard = self.lock_key(key).await;
        if let Err(e) = self.backend.remove(key).await {
            error!(key, error = %e, "Failed to remove from storage");
        }
    }

    pub async fn keys(&self) -> Vec<String> {
        self.backend.keys().await.unwrap_or_else(|e| {
            error!(error = %e, "Failed to list storage keys");
            Vec::new()
        })
    }

    /// Serialize `value` inside a `{version, data}` envelope under a dynamic key
    pub async fn set_versioned<T: Serialize + ?Sized>(&self, key: &str, version: u32, value: &T) {
        let json = match encode_value(version, value) {
            Ok(json) => json,
            Err(e) => {
                error!(key, error = %e, "Failed to serialize value");
                return;
            }
        };
        let _guard = self.lock_key(key).await;
        self.write_raw(key, json).await;
    }

    /// Read a value written by [`Storage::set_versioned`]; bare legacy values are
    /// accepted and anything newer than `version` reads as absent
    pub async fn get_versioned<T: DeserializeOwned>(&self, key: &str, version: u32) -> Option<T> {
        let raw = self.read_raw(key).await?;
        match decode_value(key, &raw, version) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(key, error = %e, "Discarding unreadable stored value");
                None
            }
        }
    }

    async fn read_record<R: Record>(&self) -> Result<R> {
        match self.read_raw(R::KEY).await {
            Some(raw) => decode::<R>(&raw),
            None => Ok(R::default()),
        }
    }

    async fn load_unlocked<R: Record>(&self) -> R {
        self.read_record().await.unwrap_or_else(|e| {
            warn!(key = R::KEY, error = %e, "Treating unreadable record as empty");
            R::default()
        })
    }

    async fn save_unlocked<R: Record>(&self, record: &R) {
        match encode(record) {
            Ok(json) => self.write_raw(R::KEY, json).await,
            Err(e) => error!(key = R::KEY, error = %e, "Failed to serialize record"),
        }
    }

    /// Load a versioned record, migrating older payloads; absent or unreadable
    /// data yields the record's default
    pub async fn load<R: Record>(&self) -> R {
        self.load_unlocked().await
    }

    /// Persist a record inside a `{version, data}` envelope
    pub async fn save<R: Record>(&self, record: &R) {
        let _guard = self.lock_key(R::KEY).await;
        self.save_unlocked(record).await;
    }

    /// Load, modify and save a record while holding its key lock.
    ///
    /// A record written by a newer schema is never overwritten: `f` then runs
    /// against an empty record and nothing is saved.
    pub async fn update<R, F, O>(&self, f: F) -> O
    where
        R: Record,
        F: FnOnce(&mut R) -> O,
    {
        let _guard = self.lock_key(R::KEY).await;
        let mut record = match self.read_record::<R>().await {
            Ok(record) => record,
            Err(e @ StorageError::UnsupportedVersion { .. }) => {
                error!(key = R::KEY, error = %e, "Leaving newer record untouched");
                return f(&mut R::default());
            }
            Err(e) => {
                warn!(key = R::KEY, error = %e, "Treating unreadable record as empty");
                R::default()
            }
        };
        let output = f(&mut record);
        self.save_unlocked(&record).await;
        debug!(key = R::KEY, "Record updated");
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Default, Serialize, Deserialize)]
    struct Tally(Vec<u32>);

    impl Record for Tally {
        const KEY: &'static str = "tally";
        const VERSION: u32 = 1;
    }

    struct BrokenStore;

    #[async_trait]
    impl KeyValueStore for BrokenStore {
        async fn get(&self, _key: &str) -> Result<Option<String>> {
            Err(StorageError::Io(std::io::Error::other("disk gone")))
        }
        async fn set(&self, _key: &str, _value: String) -> Result<()> {
            Err(StorageError::Io(std::io::Error::other("disk gone")))
        }
        async fn remove(&self, _key: &str) -> Result<()> {
            Err(StorageError::Io(std::io::Error::other("disk gone")))
        }
        async fn keys(&self) -> Result<Vec<String>> {
            Err(StorageError::Io(std::io::Error::other("disk gone")))
        }
    }

    #[tokio::test]
    async fn test_plain_values_round_trip() {
        let storage = Storage::in_memory();
        storage.set("settings", &json!({ "rate": 1.5 })).await;

        let value: Option<serde_json::Value> = storage.get("settings").await;
        assert_eq!(value, Some(json!({ "rate": 1.5 })));

        storage.remove("settings").await;
        assert!(storage.get::<serde_json::Value>("settings").await.is_none());
    }

    #[tokio::test]
    async fn test_unreadable_value_reads_as_absent() {
        let store = Arc::new(MemoryStore::new());
        store.set("tally", "{not json".to_string()).await.unwrap();
        let storage = Storage::new(store);

        assert!(storage.get::<Vec<u32>>("tally").await.is_none());
        assert!(storage.load::<Tally>().await.0.is_empty());
    }

    #[tokio::test]
    async fn test_backend_failures_degrade_to_no_data() {
        let storage = Storage::new(Arc::new(BrokenStore));

        storage.set("k", &1).await;
        storage.remove("k").await;
        assert!(storage.get::<u32>("k").await.is_none());
        assert!(storage.keys().await.is_empty());

        let len = storage.update(|tally: &mut Tally| {
            tally.0.push(1);
            tally.0.len()
        });
        assert_eq!(len.await, 1);
    }

    #[tokio::test]
    async fn test_save_writes_envelope() {
        let store = Arc::new(MemoryStore::new());
        let storage = Storage::new(store.clone());
        storage.save(&Tally(vec![4, 2])).await;

        let raw = store.get("tally").await.unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value, json!({ "version": 1, "data": [4, 2] }));
    }

    #[tokio::test]
    async fn test_update_leaves_newer_record_untouched() {
        let store = Arc::new(MemoryStore::new());
        let newer = r#"{"version":2,"data":[9,9,9]}"#;
        store.set("tally", newer.to_string()).await.unwrap();
        let storage = Storage::new(store.clone());

        let len = storage
            .update(|tally: &mut Tally| {
                tally.0.push(1);
                tally.0.len()
            })
            .await;
        assert_eq!(len, 1);
        assert_eq!(store.get("tally").await.unwrap().as_deref(), Some(newer));

        // Plain saves are explicit and still replace it
        storage.save(&Tally(vec![1])).await;
        assert_eq!(storage.load::<Tally>().await.0, vec![1]);
    }

    #[tokio::test]
    async fn test_versioned_values_use_envelopes() {
        let store = Arc::new(MemoryStore::new());
        let storage = Storage::new(store.clone());
        storage.set_versioned("cache_x", 1, &json!({ "a": 1 })).await;

        let raw = store.get("cache_x").await.unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value, json!({ "version": 1, "data": { "a": 1 } }));
        assert_eq!(
            storage.get_versioned::<serde_json::Value>("cache_x", 1).await,
            Some(json!({ "a": 1 }))
        );
        assert!(storage.get_versioned::<serde_json::Value>("cache_x", 0).await.is_none());
    }

    #[tokio::test]
    async fn test_concurrent_updates_are_serialized() {
        let storage = Storage::in_memory();

        let tasks: Vec<_> = (0..50)
            .map(|i| {
                let storage = storage.clone();
                tokio::spawn(async move {
                    storage
                        .update(|tally: &mut Tally| tally.0.push(i))
                        .await
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }

        let mut values = storage.load::<Tally>().await.0;
        values.sort_unstable();
        assert_eq!(values, (0..50).collect::<Vec<_>>());
    }
}
