use crate::storage::{Record, Storage};
use crate::types::{find_module, FavoriteItem, FavoriteRecord, Module};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

/// Favorited modules in the order they were added
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FavoriteList(pub Vec<FavoriteRecord>);

impl Record for FavoriteList {
    const KEY: &'static str = "favorites";
    const VERSION: u32 = 1;

    fn migrate(from: u32, data: Value) -> Result<Value, String> {
        match (from, data) {
            // v0 was a bare array of module ids
            (0, Value::Array(entries)) => Ok(Value::Array(
                entries
                    .into_iter()
                    .map(|entry| match entry {
                        Value::String(module_id) => json!({ "moduleId": module_id, "addedAt": null }),
                        other => other,
                    })
                    .collect(),
            )),
            (0, Value::Null) => Ok(json!([])),
            (0, other) => Err(format!("expected an array of module ids, found {}", other)),
            (_, data) => Ok(data),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FavoritesRegistry {
    storage: Storage,
}

impl FavoritesRegistry {
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    pub async fn favorite_ids(&self) -> Vec<String> {
        self.storage
            .load::<FavoriteList>()
            .await
            .0
            .into_iter()
            .map(|f| f.module_id)
            .collect()
    }

    pub async fn is_favorite(&self, module_id: &str) -> bool {
        self.storage
            .load::<FavoriteList>()
            .await
            .0
            .iter()
            .any(|f| f.module_id == module_id)
    }

    /// Flip the favorite state of `module_id` and return the new state
    pub async fn toggle_favorite(&self, module_id: &str) -> bool {
        let now_favorite = self
            .storage
            .update(|list: &mut FavoriteList| {
                let before = list.0.len();
                list.0.retain(|f| f.module_id != module_id);
                if list.0.len() < before {
                    return false;
                }
                list.0.push(FavoriteRecord {
                    module_id: module_id.to_string(),
                    added_at: Some(Utc::now()),
                });
                true
            })
            .await;
        debug!(module_id, favorite = now_favorite, "Toggled favorite");
        now_favorite
    }

    /// Join favorites with the catalog; ids the catalog no longer has are dropped
    pub async fn list_favorites_with_details(&self, catalog: &[Module]) -> Vec<FavoriteItem> {
        self.storage
            .load::<FavoriteList>()
            .await
            .0
            .into_iter()
            .filter_map(|record| {
                let module = find_module(catalog, &record.module_id)?.clone();
                Some(FavoriteItem {
                    module_id: record.module_id,
                    added_at: record.added_at,
                    module,
                })
            })
            .collect()
    }
}
