//! Resume positions for module audio.
//!
//! The media player itself belongs to the platform; only the last known
//! position of each module's track is kept here.

use crate::storage::{Record, Storage};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackState {
    pub module_id: String,
    /// Milliseconds
    pub position: u64,
    /// Milliseconds
    pub duration: u64,
    pub last_played: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlaybackTable(pub BTreeMap<String, PlaybackState>);

impl Record for PlaybackTable {
    const KEY: &'static str = "audioPlaybackStates";
    const VERSION: u32 = 1;
}

#[derive(Debug, Clone)]
pub struct PlaybackRegistry {
    storage: Storage,
}

impl PlaybackRegistry {
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    pub async fn save_state(&self, module_id: &str, position: u64, duration: u64) -> PlaybackState {
        let state = PlaybackState {
            module_id: module_id.to_string(),
            position,
            duration,
            last_played: Utc::now(),
        };
        debug!(module_id, position, duration, "Saving playback state");
        self.storage
            .update(|table: &mut PlaybackTable| {
                table.0.insert(module_id.to_string(), state.clone());
            })
            .await;
        state
    }

    pub async fn get_state(&self, module_id: &str) -> Option<PlaybackState> {
        self.storage.load::<PlaybackTable>().await.0.remove(module_id)
    }

    /// Starting position for a module, 0 when nothing was saved
    pub async fn resume_position(&self, module_id: &str) -> u64 {
        self.get_state(module_id).await.map_or(0, |s| s.position)
    }

    pub async fn clear_state(&self, module_id: &str) -> bool {
        self.storage
            .update(|table: &mut PlaybackTable| table.0.remove(module_id).is_some())
            .await
    }
}

/// Format milliseconds as `m:ss`
pub fn format_time(milliseconds: u64) -> String {
    let total_seconds = milliseconds / 1000;
    format!("{}:{:02}", total_seconds / 60, total_seconds % 60)
}

/// Played share of a track, in `[0, 1]`
pub fn calculate_progress(position: u64, duration: u64) -> f64 {
    if duration == 0 {
        return 0.0;
    }
    (position as f64 / duration as f64).min(1.0)
}
