use super::{AnalyticsEvent, EventKind};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Totals derived from the event log
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageReport {
    /// Distinct UTC calendar days with at least one event
    pub total_sessions: usize,
    pub modules_completed: usize,
    pub audio_seconds: f64,
    pub audio_minutes: u64,
    pub notes_created: usize,
    pub favorites_added: usize,
}

impl UsageReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_events(events: &[AnalyticsEvent]) -> Self {
        let mut report = Self::new();
        let mut days: HashSet<NaiveDate> = HashSet::new();

        for event in events {
            days.insert(event.timestamp.date_naive());
            report.process_event(event);
        }

        report.total_sessions = days.len();
        report.audio_minutes = (report.audio_seconds / 60.0).round() as u64;
        report
    }

    fn process_event(&mut self, event: &AnalyticsEvent) {
        if event.is(EventKind::ModuleComplete) {
            self.modules_completed += 1;
        } else if event.is(EventKind::AudioPlay) {
            self.audio_seconds += event.data["duration"].as_f64().unwrap_or(0.0);
        } else if event.is(EventKind::NoteCreated) {
            self.notes_created += 1;
        } else if event.is(EventKind::FavoriteToggle) && event.data["isFavorite"] == true {
            self.favorites_added += 1;
        }
    }
}
