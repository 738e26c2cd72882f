use std::io;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, StorageError>;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid key: {0:?}")]
    InvalidKey(String),

    #[error("Record {key} has version {found}, newest supported is {supported}")]
    UnsupportedVersion {
        key: String,
        found: u32,
        supported: u32,
    },

    #[error("Migration of {key} from version {from} failed: {reason}")]
    Migration {
        key: String,
        from: u32,
        reason: String,
    },
}
