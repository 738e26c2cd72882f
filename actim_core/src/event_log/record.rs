use super::UsageReport;
use crate::storage::{Record, Storage};
use crate::types::NoteType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use tracing::debug;

/// Default number of events retained
pub const MAX_EVENTS: usize = 1000;

/// Event types recorded by the app
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    ModuleView,
    AudioPlay,
    NoteCreated,
    FavoriteToggle,
    PathwayStart,
    ModuleComplete,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::ModuleView => "module_view",
            EventKind::AudioPlay => "audio_play",
            EventKind::NoteCreated => "note_created",
            EventKind::FavoriteToggle => "favorite_toggle",
            EventKind::PathwayStart => "pathway_start",
            EventKind::ModuleComplete => "module_complete",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<EventKind> for String {
    fn from(kind: EventKind) -> Self {
        kind.as_str().to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsEvent {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub data: Value,
    pub timestamp: DateTime<Utc>,
}

impl AnalyticsEvent {
    pub fn is(&self, kind: EventKind) -> bool {
        self.kind == kind.as_str()
    }
}

impl fmt::Display for AnalyticsEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {} {}", self.timestamp, self.kind, self.data)
    }
}

/// Persisted events, oldest first
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventList(pub Vec<AnalyticsEvent>);

impl Record for EventList {
    const KEY: &'static str = "analytics_events";
    const VERSION: u32 = 1;
}

/// Append-only event log that keeps at most `max_events` entries
#[derive(Debug, Clone)]
pub struct AnalyticsLog {
    storage: Storage,
    max_events: usize,
}

impl AnalyticsLog {
    pub fn new(storage: Storage) -> Self {
        Self::with_capacity(storage, MAX_EVENTS)
    }

    pub fn with_capacity(storage: Storage, max_events: usize) -> Self {
        Self {
            storage,
            max_events,
        }
    }

    pub fn max_events(&self) -> usize {
        self.max_events
    }

    /// Append an event, dropping the oldest entries beyond capacity
    pub async fn track_event(&self, kind: impl Into<String>, data: Value) {
        let event = AnalyticsEvent {
            kind: kind.into(),
            data,
            timestamp: Utc::now(),
        };
        debug!(kind = %event.kind, data = %event.data, "Event tracked");

        let max_events = self.max_events;
        self.storage
            .update(|events: &mut EventList| {
                events.0.push(event);
                if events.0.len() > max_events {
                    let excess = events.0.len() - max_events;
                    events.0.drain(..excess);
                }
            })
            .await;
    }

    pub async fn events(&self) -> Vec<AnalyticsEvent> {
        self.storage.load::<EventList>().await.0
    }

    pub async fn events_by_type(&self, kind: &str) -> Vec<AnalyticsEvent> {
        self.events()
            .await
            .into_iter()
            .filter(|e| e.kind == kind)
            .collect()
    }

    pub async fn clear(&self) {
        self.storage.save(&EventList::default()).await;
    }

    pub async fn track_module_view(&self, module_id: &str, pathway_id: Option<&str>) {
        self.track_event(
            EventKind::ModuleView,
            json!({ "moduleId": module_id, "pathwayId": pathway_id }),
        )
        .await;
    }

    /// `duration` is in seconds
    pub async fn track_audio_play(&self, module_id: &str, duration: f64) {
        self.track_event(
            EventKind::AudioPlay,
            json!({ "moduleId": module_id, "duration": duration }),
        )
        .await;
    }

    pub async fn track_note_created(&self, module_id: &str, note_type: NoteType) {
        self.track_event(
            EventKind::NoteCreated,
            json!({ "moduleId": module_id, "type": note_type }),
        )
        .await;
    }

    pub async fn track_favorite_toggle(&self, module_id: &str, is_favorite: bool) {
        self.track_event(
            EventKind::FavoriteToggle,
            json!({ "moduleId": module_id, "isFavorite": is_favorite }),
        )
        .await;
    }

    pub async fn track_pathway_start(&self, pathway_id: &str) {
        self.track_event(EventKind::PathwayStart, json!({ "pathwayId": pathway_id }))
            .await;
    }

    pub async fn track_module_complete(&self, module_id: &str, pathway_id: &str) {
        self.track_event(
            EventKind::ModuleComplete,
            json!({ "moduleId": module_id, "pathwayId": pathway_id }),
        )
        .await;
    }

    pub async fn usage_report(&self) -> UsageReport {
        UsageReport::from_events(&self.events().await)
    }
}
