//! Rules applied by note forms before a draft reaches the registry.

use crate::types::{NoteDraft, NoteType};
use thiserror::Error;

/// Longest accepted text note, in characters
pub const MAX_TEXT_LEN: usize = 2000;

/// Shortest recording saved without explicit confirmation, in seconds
pub const MIN_AUDIO_SECONDS: f64 = 5.0;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum NoteValidationError {
    #[error("Note text is empty")]
    EmptyText,

    #[error("Note text has {len} characters, limit is {max}")]
    TextTooLong { len: usize, max: usize },

    #[error("There is no recording to save")]
    MissingRecording,

    #[error("Recording is {duration:.0}s long, minimum is {min:.0}s")]
    RecordingTooShort { duration: f64, min: f64 },
}

impl NoteValidationError {
    /// Whether the user may choose to save anyway
    pub fn is_overridable(&self) -> bool {
        matches!(self, NoteValidationError::RecordingTooShort { .. })
    }
}

pub fn validate_text(content: &str) -> Result<(), NoteValidationError> {
    if content.trim().is_empty() {
        return Err(NoteValidationError::EmptyText);
    }
    let len = content.chars().count();
    if len > MAX_TEXT_LEN {
        return Err(NoteValidationError::TextTooLong {
            len,
            max: MAX_TEXT_LEN,
        });
    }
    Ok(())
}

pub fn validate_recording(
    audio_path: Option<&str>,
    duration: f64,
) -> Result<(), NoteValidationError> {
    if audio_path.map_or(true, |p| p.trim().is_empty()) {
        return Err(NoteValidationError::MissingRecording);
    }
    if duration < MIN_AUDIO_SECONDS {
        return Err(NoteValidationError::RecordingTooShort {
            duration,
            min: MIN_AUDIO_SECONDS,
        });
    }
    Ok(())
}

pub fn validate_draft(draft: &NoteDraft) -> Result<(), NoteValidationError> {
    match draft.kind {
        NoteType::Text => validate_text(draft.content.as_deref().unwrap_or_default()),
        NoteType::Audio => {
            validate_recording(draft.audio_path.as_deref(), draft.duration.unwrap_or(0.0))
        }
    }
}
