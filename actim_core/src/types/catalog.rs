use serde::{Deserialize, Serialize};

/// A unit of learning content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Module {
    pub module_id: String,
    pub title: String,
    #[serde(default)]
    pub markdown_path: String,
    #[serde(default)]
    pub audio_path: String,
    #[serde(default)]
    pub category: String,
}

/// An ordered curriculum of modules
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pathway {
    pub pathway_id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub module_ids: Vec<String>,
}

pub fn find_module<'a>(catalog: &'a [Module], module_id: &str) -> Option<&'a Module> {
    catalog.iter().find(|m| m.module_id == module_id)
}
