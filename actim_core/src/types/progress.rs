use super::Pathway;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Completion state of one pathway
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProgress {
    pub pathway_id: String,
    pub current_module_index: usize,
    /// No duplicates; every entry belongs to the pathway
    pub completed_module_ids: Vec<String>,
    pub last_accessed: DateTime<Utc>,
    /// Pathway length when this entry was created
    pub total_modules: usize,
    /// Cached ratio, recomputed on every read and write
    #[serde(default)]
    pub progress_percentage: f64,
}

impl UserProgress {
    pub fn new(pathway_id: impl Into<String>, total_modules: usize) -> Self {
        Self {
            pathway_id: pathway_id.into(),
            current_module_index: 0,
            completed_module_ids: Vec::new(),
            last_accessed: Utc::now(),
            total_modules,
            progress_percentage: 0.0,
        }
    }

    pub fn is_completed(&self, module_id: &str) -> bool {
        self.completed_module_ids.iter().any(|id| id == module_id)
    }

    /// Completed share of the pathway, in `[0, 1]`
    pub fn computed_percentage(&self) -> f64 {
        if self.total_modules == 0 {
            return 0.0;
        }
        (self.completed_module_ids.len() as f64 / self.total_modules as f64).min(1.0)
    }

    pub fn refresh_percentage(&mut self) {
        self.progress_percentage = self.computed_percentage();
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathwayWithProgress {
    #[serde(flatten)]
    pub pathway: Pathway,
    pub progress: Option<UserProgress>,
}
