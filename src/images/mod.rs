//! Product image resolution
//!
//! Images come from two sources: an authoritative prior export whose URLs are
//! trusted as-is, and a local directory of processed images whose public URLs
//! are synthesized from a base URL. The authoritative source always wins.
//!
//! - [`sources`]: loading both asset catalogs
//! - [`resolver`]: choosing the asset references for one handle
//! - [`expand`]: rewriting the dataset, one primary row into many image rows

pub mod expand;
pub mod resolver;
pub mod sources;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use expand::{ImageEntry, ImageExpansion, ImageReport};
pub use resolver::{ImageResolver, Resolution};
pub use sources::{AuthoritativeImages, LocalAssetDirectory, slugify};

use crate::export::ExportError;
use crate::import::ImportError;

/// Image settings shared by the resolver and the expansion stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    /// Prefix for URLs synthesized from local filenames
    pub base_url: String,
    /// Regexes for URLs that must never be published
    pub private_patterns: Vec<String>,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            base_url: "https://cdn.example.com/products".to_string(),
            private_patterns: vec![
                r"(?i)^https?://(localhost|127\.0\.0\.1)([:/]|$)".to_string(),
                r"(?i)^file:".to_string(),
                r"(?i)^https?://[^/]+\.(local|internal)([:/]|$)".to_string(),
                r"(?i)/private/".to_string(),
            ],
        }
    }
}

/// Where an asset reference came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetSource {
    Authoritative,
    Local,
}

/// An externally hosted image for one product
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetRef {
    pub url: String,
    /// 1 is the primary image
    pub position: usize,
    pub source: AssetSource,
}

/// Errors loading image sources or writing the mapping report
#[derive(Error, Debug)]
pub enum ImageError {
    #[error("Cannot read asset directory {path}: {source}")]
    Directory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot load authoritative images: {0}")]
    Import(#[from] ImportError),

    #[error("Cannot write image report: {0}")]
    Export(#[from] ExportError),
}
