//! Catalog lookup tables
//!
//! Every table a pipeline stage consults (shapes, shift rules, tag keywords,
//! weight rules, price tiers, deactivation rules, image sources) lives in one
//! [`CatalogConfig`] that is loaded once per run and handed to each stage when
//! it is constructed. The built-in defaults describe the dry-eye product line
//! this tool was written for.
//!
//! # Example
//!
//! ```rust,ignore
//! use catalog_repair::config::CatalogConfig;
//!
//! let config = CatalogConfig::load("catalog.toml")?;
//! assert_eq!(config.detection.sku_prefix, "ECOC");
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::debug;

use crate::enrich::{
    DeactivationConfig, InventoryConfig, PricingConfig, SeoConfig, StatusConfig, TagConfig,
    WeightConfig,
};
use crate::images::ImageConfig;
use crate::validation::DetectionConfig;

/// Errors raised while loading or compiling lookup tables
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid TOML in {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid YAML in {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Unsupported config format: {0} (expected .toml, .yaml or .yml)")]
    UnsupportedFormat(PathBuf),

    #[error("Invalid pattern '{pattern}' in {context}: {source}")]
    InvalidPattern {
        context: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// All lookup tables used by one pipeline run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub detection: DetectionConfig,
    pub tags: TagConfig,
    pub weights: WeightConfig,
    pub pricing: PricingConfig,
    pub status: StatusConfig,
    pub deactivation: DeactivationConfig,
    pub seo: SeoConfig,
    pub inventory: InventoryConfig,
    pub images: ImageConfig,
}

impl CatalogConfig {
    /// Load a config file, choosing the format from its extension.
    ///
    /// Sections missing from the file keep their built-in defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let config = match extension.as_deref() {
            Some("toml") => Self::from_toml(&content).map_err(|source| ConfigError::Toml {
                path: path.to_path_buf(),
                source,
            })?,
            Some("yaml") | Some("yml") => {
                serde_yaml::from_str(&content).map_err(|source| ConfigError::Yaml {
                    path: path.to_path_buf(),
                    source,
                })?
            }
            _ => return Err(ConfigError::UnsupportedFormat(path.to_path_buf())),
        };

        debug!(path = %path.display(), "Loaded catalog config");
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Stable digest of the effective tables, recorded in run reports.
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        // Serializing plain data to JSON cannot fail.
        let json = serde_json::to_string(self).unwrap_or_default();
        hasher.update(json.as_bytes());
        format!("{:x}", hasher.finalize())
    }
}
