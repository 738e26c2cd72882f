//! Read-only content catalog consulted by the registries.
//!
//! The app loads its modules and pathways from bundled assets; this crate only
//! consumes them. [`StaticCatalog`] is an in-memory catalog that can be filled
//! from a TOML document with `[[modules]]` and `[[pathways]]` tables.

use crate::types::{Module, Pathway};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Duplicate module id: {0}")]
    DuplicateModule(String),

    #[error("Duplicate pathway id: {0}")]
    DuplicatePathway(String),
}

/// Source of module and pathway metadata.
///
/// Loading never fails from the caller's point of view: an implementation that
/// cannot read its content returns empty sequences.
#[async_trait]
pub trait ContentCatalog: Send + Sync {
    async fn load_modules(&self) -> Vec<Module>;
    async fn load_pathways(&self) -> Vec<Pathway>;
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StaticCatalog {
    #[serde(default)]
    pub modules: Vec<Module>,
    #[serde(default)]
    pub pathways: Vec<Pathway>,
}

impl StaticCatalog {
    pub fn new(modules: Vec<Module>, pathways: Vec<Pathway>) -> Self {
        Self { modules, pathways }
    }

    pub fn from_toml_str(content: &str) -> Result<Self, CatalogError> {
        let catalog: StaticCatalog = toml::from_str(content)?;
        catalog.validate()?;
        Ok(catalog)
    }

    pub async fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        debug!(path = %path.display(), "Loading catalog");
        let content = tokio::fs::read_to_string(path).await?;
        Self::from_toml_str(&content)
    }

    fn validate(&self) -> Result<(), CatalogError> {
        let mut seen = std::collections::HashSet::new();
        for module in &self.modules {
            if !seen.insert(module.module_id.as_str()) {
                return Err(CatalogError::DuplicateModule(module.module_id.clone()));
            }
        }
        let mut seen = std::collections::HashSet::new();
        for pathway in &self.pathways {
            if !seen.insert(pathway.pathway_id.as_str()) {
                return Err(CatalogError::DuplicatePathway(pathway.pathway_id.clone()));
            }
        }
        Ok(())
    }

    pub fn pathway(&self, pathway_id: &str) -> Option<&Pathway> {
        self.pathways.iter().find(|p| p.pathway_id == pathway_id)
    }
}

#[async_trait]
impl ContentCatalog for StaticCatalog {
    async fn load_modules(&self) -> Vec<Module> {
        self.modules.clone()
    }

    async fn load_pathways(&self) -> Vec<Pathway> {
        self.pathways.clone()
    }
}
