use crate::cache::OfflineCache;
use crate::config::Config;
use crate::event_log::AnalyticsLog;
use crate::favorites::FavoritesRegistry;
use crate::notes::NotesRegistry;
use crate::playback::PlaybackRegistry;
use crate::progress::ProgressTracker;
use crate::storage::{FileStore, KeyValueStore, MemoryStore, Storage, StorageError};
use std::sync::Arc;
use tracing::info;

/// Every registry, built once at start-up over one shared store.
///
/// Clones share the same store and key locks.
#[derive(Debug, Clone)]
pub struct AppContext {
    pub storage: Storage,
    pub progress: ProgressTracker,
    pub favorites: FavoritesRegistry,
    pub notes: NotesRegistry,
    pub analytics: AnalyticsLog,
    pub playback: PlaybackRegistry,
    pub cache: OfflineCache,
}

impl AppContext {
    pub fn with_store(backend: Arc<dyn KeyValueStore>, config: &Config) -> Self {
        let storage = Storage::new(backend);
        Self {
            progress: ProgressTracker::new(storage.clone()),
            favorites: FavoritesRegistry::new(storage.clone()),
            notes: NotesRegistry::new(storage.clone()),
            analytics: AnalyticsLog::with_capacity(storage.clone(), config.max_analytics_events),
            playback: PlaybackRegistry::new(storage.clone()),
            cache: OfflineCache::new(storage.clone(), config.cache_ttl(), config.cache_retention()),
            storage,
        }
    }

    /// Open the file-backed store under `config.data_dir`
    pub async fn open(config: &Config) -> Result<Self, StorageError> {
        let store = FileStore::open(&config.data_dir).await?;
        info!(data_dir = %config.data_dir.display(), "Opened app state");
        Ok(Self::with_store(Arc::new(store), config))
    }

    pub fn in_memory() -> Self {
        Self::with_store(Arc::new(MemoryStore::new()), &Config::default())
    }
}
