//! Registry configuration
//!
//! The engine is built once from an [`EngineConfig`]: either the registry
//! bundled into the crate or an operator-supplied JSON file of the same
//! shape:
//!
//! ```json
//! {
//!   "version": "2.0.2",
//!   "sites": [{"domain": "youtube.com", "n": "YouTube", "c": "Видео", "t": ["видео"]}],
//!   "patterns": ["-verify.", {"regex": "g[o0]{2}g[l1]e-"}]
//! }
//! ```
//!
//! All invariants are checked here, at startup, never at classification time.

use std::fs;
use std::path::{Path, PathBuf};

use log::info;
use serde::{Deserialize, Serialize};

use crate::classifier::Classifier;
use crate::patterns::{PatternError, PatternSet, PatternSpec};
use crate::registry::{Registry, RegistryError, SiteEntry};

/// Registry shipped with the extension.
pub const BUNDLED_REGISTRY: &str = include_str!("../data/default_registry.json");

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid registry JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid registry: {0}")]
    Registry(#[from] RegistryError),
    #[error("Invalid pattern: {0}")]
    Pattern(#[from] PatternError),
}

fn default_version() -> String {
    "1".to_string()
}

/// Serializable engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub sites: Vec<SiteEntry>,
    #[serde(default)]
    pub patterns: Vec<PatternSpec>,
}

impl EngineConfig {
    /// Parse the bundled registry.
    pub fn bundled() -> Result<Self, ConfigError> {
        Self::from_json(BUNDLED_REGISTRY)
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    /// Validate and compile into a classifier.
    pub fn build(&self) -> Result<Classifier, ConfigError> {
        let registry = Registry::from_entries(self.sites.iter().cloned())?;
        let patterns = PatternSet::from_specs(&self.patterns)?;
        info!(
            "Registry v{} loaded: {} sites, {} categories, {} patterns",
            self.version,
            registry.len(),
            registry.category_count(),
            patterns.len()
        );
        Ok(Classifier::new(registry, patterns))
    }

    /// Snapshot an existing classifier back into configuration form.
    pub fn from_classifier(classifier: &Classifier, version: &str, description: &str) -> Self {
        Self {
            version: version.to_string(),
            description: description.to_string(),
            sites: classifier.registry().entries(),
            patterns: classifier.patterns().specs(),
        }
    }

    pub fn to_json_pretty(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
