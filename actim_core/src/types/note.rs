use super::{Module, Timestamped};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoteType {
    Text,
    Audio,
}

impl NoteType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NoteType::Text => "text",
            NoteType::Audio => "audio",
        }
    }
}

impl fmt::Display for NoteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user-authored annotation attached to a module.
///
/// Text notes carry `content`; audio notes carry `audio_path` and `duration` (seconds).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteItem {
    pub id: String,
    pub module_id: String,
    #[serde(rename = "type")]
    pub kind: NoteType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl NoteItem {
    pub fn from_draft(draft: NoteDraft) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            module_id: draft.module_id,
            kind: draft.kind,
            content: draft.content,
            audio_path: draft.audio_path,
            duration: draft.duration,
            created_at: now,
            updated_at: now,
        }
    }

    /// Merge the fields present in `patch` and stamp `updated_at`
    pub fn apply(&mut self, patch: NotePatch) {
        if let Some(content) = patch.content {
            self.content = Some(content);
        }
        if let Some(audio_path) = patch.audio_path {
            self.audio_path = Some(audio_path);
        }
        if let Some(duration) = patch.duration {
            self.duration = Some(duration);
        }
        self.updated_at = Utc::now();
    }
}

impl Timestamped for NoteItem {
    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Caller-supplied fields for a new note
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteDraft {
    pub module_id: String,
    #[serde(rename = "type")]
    pub kind: NoteType,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub audio_path: Option<String>,
    #[serde(default)]
    pub duration: Option<f64>,
}

impl NoteDraft {
    pub fn text(module_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            module_id: module_id.into(),
            kind: NoteType::Text,
            content: Some(content.into()),
            audio_path: None,
            duration: None,
        }
    }

    pub fn audio(module_id: impl Into<String>, audio_path: impl Into<String>, duration: f64) -> Self {
        Self {
            module_id: module_id.into(),
            kind: NoteType::Audio,
            content: None,
            audio_path: Some(audio_path.into()),
            duration: Some(duration),
        }
    }
}

/// Partial update for an existing note; `None` fields are left untouched
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotePatch {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub audio_path: Option<String>,
    #[serde(default)]
    pub duration: Option<f64>,
}

impl NotePatch {
    pub fn content(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::default()
        }
    }
}

/// A note joined with its module, if the catalog still has it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteWithModule {
    #[serde(flatten)]
    pub note: NoteItem,
    pub module: Option<Module>,
}

impl Timestamped for NoteWithModule {
    fn created_at(&self) -> DateTime<Utc> {
        self.note.created_at
    }
}
