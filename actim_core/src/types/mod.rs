//! Records shared by the registries: read-only catalog content and the
//! user-owned state persisted alongside it.

mod catalog;
mod favorite;
mod note;
mod progress;

pub use catalog::{find_module, Module, Pathway};
pub use favorite::{FavoriteItem, FavoriteRecord};
pub use note::{NoteDraft, NoteItem, NotePatch, NoteType, NoteWithModule};
pub use progress::{PathwayWithProgress, UserProgress};

use chrono::{DateTime, Utc};

/// Entities ordered by when they were created
pub trait Timestamped {
    fn created_at(&self) -> DateTime<Utc>;
}

/// Sort newest first by creation time; ties keep their stored order
pub fn sort_newest_first<T: Timestamped>(items: &mut [T]) {
    items.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
}
