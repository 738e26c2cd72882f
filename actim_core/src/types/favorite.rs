use super::Module;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Persisted favorite entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteRecord {
    pub module_id: String,
    /// `None` for entries migrated from the bare-ID format, whose add time was never recorded
    #[serde(default)]
    pub added_at: Option<DateTime<Utc>>,
}

/// A favorite joined with its catalog module
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteItem {
    pub module_id: String,
    pub added_at: Option<DateTime<Utc>>,
    pub module: Module,
}
