//! Text and audio notes attached to modules.
//!
//! The registry stores whatever it is given. Input rules for note forms live in
//! [`validation`] and are applied by callers before saving.

pub mod validation;

use crate::storage::{Record, Storage};
use crate::types::{
    find_module, sort_newest_first, Module, NoteDraft, NoteItem, NotePatch, NoteWithModule,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// Every note, in creation order
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoteList(pub Vec<NoteItem>);

impl Record for NoteList {
    const KEY: &'static str = "notes";
    const VERSION: u32 = 1;

    fn migrate(from: u32, data: Value) -> Result<Value, String> {
        match (from, data) {
            // v0 notes could lack updatedAt
            (0, Value::Array(mut notes)) => {
                for note in notes.iter_mut() {
                    if let Value::Object(fields) = note {
                        if !fields.contains_key("updatedAt") {
                            let created = fields.get("createdAt").cloned().unwrap_or(Value::Null);
                            fields.insert("updatedAt".to_string(), created);
                        }
                    }
                }
                Ok(Value::Array(notes))
            }
            (0, Value::Null) => Ok(Value::Array(Vec::new())),
            (0, other) => Err(format!("expected an array of notes, found {}", other)),
            (_, data) => Ok(data),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NotesRegistry {
    storage: Storage,
}

impl NotesRegistry {
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    pub async fn all_notes(&self) -> Vec<NoteItem> {
        self.storage.load::<NoteList>().await.0
    }

    /// Append a new note and return the full list
    pub async fn save_note(&self, draft: NoteDraft) -> Vec<NoteItem> {
        let note = NoteItem::from_draft(draft);
        debug!(note_id = %note.id, module_id = %note.module_id, kind = %note.kind, "Saving note");
        self.storage
            .update(|list: &mut NoteList| {
                list.0.push(note);
                list.0.clone()
            })
            .await
    }

    /// Notes for one module, newest first
    pub async fn get_notes_by_module(&self, module_id: &str) -> Vec<NoteItem> {
        let mut notes: Vec<NoteItem> = self
            .all_notes()
            .await
            .into_iter()
            .filter(|n| n.module_id == module_id)
            .collect();
        sort_newest_first(&mut notes);
        notes
    }

    /// Every note with its module joined in, newest first
    pub async fn get_notes_with_details(&self, catalog: &[Module]) -> Vec<NoteWithModule> {
        let mut notes: Vec<NoteWithModule> = self
            .all_notes()
            .await
            .into_iter()
            .map(|note| {
                let module = find_module(catalog, &note.module_id).cloned();
                NoteWithModule { note, module }
            })
            .collect();
        sort_newest_first(&mut notes);
        notes
    }

    /// Merge `patch` into the note with `id`; an unknown id changes nothing
    pub async fn update_note(&self, id: &str, patch: NotePatch) -> Vec<NoteItem> {
        self.storage
            .update(|list: &mut NoteList| {
                match list.0.iter_mut().find(|n| n.id == id) {
                    Some(note) => {
                        note.apply(patch);
                        debug!(note_id = id, "Updated note");
                    }
                    None => debug!(note_id = id, "No note to update"),
                }
                list.0.clone()
            })
            .await
    }

    /// Remove the note with `id`; removing an unknown id changes nothing
    pub async fn delete_note(&self, id: &str) -> Vec<NoteItem> {
        self.storage
            .update(|list: &mut NoteList| {
                list.0.retain(|n| n.id != id);
                list.0.clone()
            })
            .await
    }
}
