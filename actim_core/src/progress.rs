use crate::storage::{Record, Storage};
use crate::types::{Module, Pathway, PathwayWithProgress, UserProgress};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, warn};

/// Persisted progress of every pathway, keyed by pathway id
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProgressTable(pub BTreeMap<String, UserProgress>);

impl Record for ProgressTable {
    const KEY: &'static str = "userProgress";
    const VERSION: u32 = 1;
}

/// Tracks per-pathway module completion
#[derive(Debug, Clone)]
pub struct ProgressTracker {
    storage: Storage,
}

impl ProgressTracker {
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    async fn load_table(&self) -> BTreeMap<String, UserProgress> {
        let mut table = self.storage.load::<ProgressTable>().await.0;
        // The stored percentage is only a cache
        for progress in table.values_mut() {
            progress.refresh_percentage();
        }
        table
    }

    pub async fn get_all_progress(&self) -> BTreeMap<String, UserProgress> {
        self.load_table().await
    }

    pub async fn get_progress(&self, pathway_id: &str) -> Option<UserProgress> {
        self.load_table().await.remove(pathway_id)
    }

    /// Mark `module_id` complete within `pathway_id`.
    ///
    /// `pathway_modules` is the pathway's ordered module list. A module outside that
    /// list leaves the completed set alone but still counts as an access.
    pub async fn record_module_completion(
        &self,
        pathway_id: &str,
        module_id: &str,
        pathway_modules: &[String],
    ) -> UserProgress {
        self.storage
            .update(|table: &mut ProgressTable| {
                let progress = table
                    .0
                    .entry(pathway_id.to_string())
                    .or_insert_with(|| UserProgress::new(pathway_id, pathway_modules.len()));

                match pathway_modules.iter().position(|id| id == module_id) {
                    Some(index) => {
                        progress.current_module_index = index;
                        if !progress.is_completed(module_id) {
                            progress.completed_module_ids.push(module_id.to_string());
                        }
                    }
                    None => {
                        warn!(pathway_id, module_id, "Module is not part of pathway");
                    }
                }

                progress.refresh_percentage();
                progress.last_accessed = Utc::now();
                debug!(
                    pathway_id,
                    module_id,
                    completed = progress.completed_module_ids.len(),
                    total = progress.total_modules,
                    "Recorded module completion"
                );
                progress.clone()
            })
            .await
    }

    /// Share of catalog modules completed in any pathway, in `[0, 1]`
    pub async fn get_overall_progress(&self, all_modules: &[Module]) -> f64 {
        let catalog: HashSet<&str> = all_modules.iter().map(|m| m.module_id.as_str()).collect();
        if catalog.is_empty() {
            return 0.0;
        }

        let table = self.load_table().await;
        let completed: HashSet<&str> = table
            .values()
            .flat_map(|p| p.completed_module_ids.iter().map(String::as_str))
            .collect();

        (completed.len() as f64 / catalog.len() as f64).min(1.0)
    }

    /// Pair each pathway with its stored progress, keeping the given order
    pub async fn pathways_with_progress(&self, pathways: &[Pathway]) -> Vec<PathwayWithProgress> {
        let mut table = self.load_table().await;
        pathways
            .iter()
            .map(|pathway| PathwayWithProgress {
                pathway: pathway.clone(),
                progress: table.remove(&pathway.pathway_id),
            })
            .collect()
    }

    /// Forget one pathway's progress; returns whether it existed
    pub async fn reset_progress(&self, pathway_id: &str) -> bool {
        self.storage
            .update(|table: &mut ProgressTable| table.0.remove(pathway_id).is_some())
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    /// Push a pathway's stored access time one day into the past
    async fn backdate(storage: &Storage, pathway_id: &str) -> chrono::DateTime<Utc> {
        let when = Utc::now() - chrono::Duration::days(1);
        storage
            .update(|table: &mut ProgressTable| {
                if let Some(progress) = table.0.get_mut(pathway_id) {
                    progress.last_accessed = when;
                }
            })
            .await;
        when
    }

    fn module(id: &str) -> Module {
        Module {
            module_id: id.to_string(),
            title: id.to_uppercase(),
            markdown_path: String::new(),
            audio_path: String::new(),
            category: String::new(),
        }
    }

    #[tokio::test]
    async fn test_first_completion_creates_entry() {
        let tracker = ProgressTracker::new(Storage::in_memory());
        let modules = ids(&["m1", "m2", "m3"]);

        let progress = tracker.record_module_completion("p1", "m2", &modules).await;

        assert_eq!(progress.current_module_index, 1);
        assert_eq!(progress.completed_module_ids, vec!["m2"]);
        assert_eq!(progress.total_modules, 3);
        assert!((progress.progress_percentage - 1.0 / 3.0).abs() < 1e-9);
        assert_eq!(tracker.get_progress("p1").await, Some(progress));
    }

    #[tokio::test]
    async fn test_completion_is_idempotent() {
        let tracker = ProgressTracker::new(Storage::in_memory());
        let modules = ids(&["m1", "m2"]);

        let first = tracker.record_module_completion("p1", "m1", &modules).await;
        let backdated = backdate(&tracker.storage, "p1").await;
        let second = tracker.record_module_completion("p1", "m1", &modules).await;

        assert_eq!(first.completed_module_ids, second.completed_module_ids);
        assert_eq!(second.progress_percentage, 0.5);
        assert!(second.last_accessed > backdated);
    }

    #[tokio::test]
    async fn test_unknown_module_keeps_index_and_set() {
        let tracker = ProgressTracker::new(Storage::in_memory());
        let modules = ids(&["m1", "m2"]);

        tracker.record_module_completion("p1", "m2", &modules).await;
        let backdated = backdate(&tracker.storage, "p1").await;
        let progress = tracker.record_module_completion("p1", "zz", &modules).await;

        assert_eq!(progress.current_module_index, 1);
        assert_eq!(progress.completed_module_ids, vec!["m2"]);
        assert!(progress.last_accessed > backdated);
    }

    #[tokio::test]
    async fn test_empty_pathway_has_zero_percentage() {
        let tracker = ProgressTracker::new(Storage::in_memory());
        let progress = tracker.record_module_completion("empty", "m1", &[]).await;
        assert_eq!(progress.total_modules, 0);
        assert_eq!(progress.progress_percentage, 0.0);
    }

    #[tokio::test]
    async fn test_percentage_invariant_after_each_mutation() {
        let tracker = ProgressTracker::new(Storage::in_memory());
        let modules = ids(&["a", "b", "c", "d"]);

        for id in ["a", "c", "a", "d", "b"] {
            tracker.record_module_completion("p", id, &modules).await;
            for progress in tracker.get_all_progress().await.values() {
                let expected =
                    progress.completed_module_ids.len() as f64 / progress.total_modules as f64;
                assert_eq!(progress.progress_percentage, expected);
            }
        }
    }

    #[tokio::test]
    async fn test_overall_progress_counts_shared_module_once() {
        let tracker = ProgressTracker::new(Storage::in_memory());
        tracker
            .record_module_completion("p1", "a", &ids(&["a", "b"]))
            .await;
        tracker
            .record_module_completion("p2", "a", &ids(&["a", "c"]))
            .await;

        let catalog = vec![module("a"), module("b"), module("c"), module("d")];
        assert_eq!(tracker.get_overall_progress(&catalog).await, 0.25);
    }

    #[tokio::test]
    async fn test_overall_progress_empty_catalog() {
        let tracker = ProgressTracker::new(Storage::in_memory());
        assert_eq!(tracker.get_overall_progress(&[]).await, 0.0);
    }

    #[tokio::test]
    async fn test_stale_stored_percentage_is_recomputed() {
        let storage = Storage::in_memory();
        let mut progress = UserProgress::new("p1", 4);
        progress.completed_module_ids = ids(&["m1"]);
        progress.progress_percentage = 0.9;
        let mut table = BTreeMap::new();
        table.insert("p1".to_string(), progress);
        storage.save(&ProgressTable(table)).await;

        let tracker = ProgressTracker::new(storage);
        assert_eq!(tracker.get_progress("p1").await.unwrap().progress_percentage, 0.25);
    }

    #[tokio::test]
    async fn test_pathways_with_progress_and_reset() {
        let tracker = ProgressTracker::new(Storage::in_memory());
        let pathways = vec![
            Pathway {
                pathway_id: "p1".into(),
                name: "One".into(),
                description: String::new(),
                category: String::new(),
                module_ids: ids(&["m1"]),
            },
            Pathway {
                pathway_id: "p2".into(),
                name: "Two".into(),
                description: String::new(),
                category: String::new(),
                module_ids: ids(&["m2"]),
            },
        ];
        tracker
            .record_module_completion("p1", "m1", &pathways[0].module_ids)
            .await;

        let joined = tracker.pathways_with_progress(&pathways).await;
        assert_eq!(joined.len(), 2);
        assert_eq!(joined[0].progress.as_ref().unwrap().progress_percentage, 1.0);
        assert!(joined[1].progress.is_none());

        assert!(tracker.reset_progress("p1").await);
        assert!(!tracker.reset_progress("p1").await);
        assert!(tracker.get_all_progress().await.is_empty());
    }
}
