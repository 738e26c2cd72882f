//! Storage module providing the key-value layer every registry persists through.
//!
//! This module defines the KeyValueStore trait which serves as a common interface for
//! different storage backends. It currently includes two implementations:
//! - FileStore: A persistent backend that keeps one JSON file per key on disk
//! - MemoryStore: An ephemeral backend for testing and temporary storage
//!
//! Backends deal in raw strings and report failures. The [`Storage`] handle sits on
//! top of a backend, encodes values as JSON, wraps records in versioned envelopes and
//! turns every failure into a logged "no data" result.

mod error;
mod file;
mod handle;
mod memory;
mod record;

pub use error::{Result, StorageError};
pub use file::FileStore;
pub use handle::Storage;
pub use memory::MemoryStore;
pub use record::Record;

use async_trait::async_trait;

/// Common interface for raw string storage keyed by logical name.
///
/// Implementations must make `set` atomic per key: a concurrent `get` sees either
/// the previous value or the new one, never a partial write.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read the raw value stored under `key`
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Replace the value stored under `key`
    async fn set(&self, key: &str, value: String) -> Result<()>;

    /// Delete `key`; deleting an absent key is not an error
    async fn remove(&self, key: &str) -> Result<()>;

    /// List every key currently stored
    async fn keys(&self) -> Result<Vec<String>>;
}
