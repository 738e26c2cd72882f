pub mod cache;
pub mod catalog;
pub mod config;
pub mod context;
pub mod event_log;
pub mod favorites;
pub mod notes;
pub mod playback;
pub mod progress;
pub mod storage;
pub mod types;

pub use cache::OfflineCache;
pub use catalog::{CatalogError, ContentCatalog, StaticCatalog};
pub use config::{Config, ConfigError};
pub use context::AppContext;
pub use event_log::{AnalyticsEvent, AnalyticsLog, EventKind, UsageReport, MAX_EVENTS};
pub use favorites::FavoritesRegistry;
pub use notes::NotesRegistry;
pub use playback::{PlaybackRegistry, PlaybackState};
pub use progress::ProgressTracker;
pub use storage::{FileStore, KeyValueStore, MemoryStore, Storage, StorageError};
pub use types::{
    FavoriteItem, Module, NoteDraft, NoteItem, NotePatch, NoteType, NoteWithModule, Pathway,
    PathwayWithProgress, UserProgress,
};
