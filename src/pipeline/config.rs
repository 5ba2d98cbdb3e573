//! Pipeline configuration types

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::config::CatalogConfig;

/// Main pipeline configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Catalog export to repair
    pub input: Option<PathBuf>,
    /// Destination for the corrected catalog
    pub output: Option<PathBuf>,
    /// Prior export whose image URLs are trusted
    pub authoritative_images: Option<PathBuf>,
    /// Directory of processed product images
    pub asset_dir: Option<PathBuf>,
    /// Overrides `images.base_url` from the catalog config
    pub base_url: Option<String>,
    /// Where to write the image mapping report
    pub image_report: Option<PathBuf>,
    /// Where to write the JSON run report
    pub summary: Option<PathBuf>,
    /// Stages to run (empty = all)
    pub stages: Vec<PipelineStage>,
    /// Inspect every row for column shifts, ignoring the allow-list
    pub scan_all: bool,
    /// Enable dry-run mode
    pub dry_run: bool,
    /// Verbose output
    pub verbose: bool,
    /// Lookup tables
    pub catalog: CatalogConfig,
}

impl PipelineConfig {
    /// Create a new pipeline config
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the input catalog
    pub fn with_input(mut self, path: impl Into<PathBuf>) -> Self {
        self.input = Some(path.into());
        self
    }

    /// Set the output catalog
    pub fn with_output(mut self, path: impl Into<PathBuf>) -> Self {
        self.output = Some(path.into());
        self
    }

    /// Set the authoritative image export
    pub fn with_authoritative_images(mut self, path: impl Into<PathBuf>) -> Self {
        self.authoritative_images = Some(path.into());
        self
    }

    /// Set the local image directory
    pub fn with_asset_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.asset_dir = Some(path.into());
        self
    }

    /// Override the base URL for local images
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the image mapping report path
    pub fn with_image_report(mut self, path: impl Into<PathBuf>) -> Self {
        self.image_report = Some(path.into());
        self
    }

    /// Set the JSON summary path
    pub fn with_summary(mut self, path: impl Into<PathBuf>) -> Self {
        self.summary = Some(path.into());
        self
    }

    /// Set specific stages to run
    pub fn with_stages(mut self, stages: Vec<PipelineStage>) -> Self {
        self.stages = stages;
        self
    }

    /// Ignore the detection allow-list
    pub fn with_scan_all(mut self, scan_all: bool) -> Self {
        self.scan_all = scan_all;
        self
    }

    /// Enable dry-run mode
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Enable verbose output
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Set the lookup tables
    pub fn with_catalog(mut self, catalog: CatalogConfig) -> Self {
        self.catalog = catalog;
        self
    }

    /// Get stages to run in execution order (all if empty).
    ///
    /// Reading is the source of every other stage, so it is always included.
    pub fn effective_stages(&self) -> Vec<PipelineStage> {
        if self.stages.is_empty() {
            return PipelineStage::all();
        }
        PipelineStage::all()
            .into_iter()
            .filter(|stage| *stage == PipelineStage::Read || self.stages.contains(stage))
            .collect()
    }

    /// Check if a specific stage should run
    pub fn should_run_stage(&self, stage: PipelineStage) -> bool {
        self.effective_stages().contains(&stage)
    }

    /// Base URL for synthesized image URLs
    pub fn effective_base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or(&self.catalog.images.base_url)
    }

    /// Whether any image source is configured
    pub fn has_image_sources(&self) -> bool {
        self.authoritative_images.is_some() || self.asset_dir.is_some()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.input.is_none() {
            return Err("Input catalog is required".to_string());
        }

        if self.should_run_stage(PipelineStage::Write) && !self.dry_run && self.output.is_none() {
            return Err("Output path is required for write stage".to_string());
        }

        if let (Some(input), Some(output)) = (&self.input, &self.output) {
            if input == output {
                return Err("Output path must differ from the input path".to_string());
            }
        }

        if self.image_report.is_some() && !self.should_run_stage(PipelineStage::Images) {
            return Err("Image report requires the images stage".to_string());
        }

        Ok(())
    }
}

/// Pipeline stages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PipelineStage {
    /// Stage 1: Read the catalog export
    Read,
    /// Stage 2: Detect and repair column-shifted rows
    Repair,
    /// Stage 3: Apply enrichment transforms
    Enrich,
    /// Stage 4: Resolve product images
    Images,
    /// Stage 5: Write the corrected catalog
    Write,
}

impl PipelineStage {
    /// Get all stages in execution order
    pub fn all() -> Vec<Self> {
        vec![
            Self::Read,
            Self::Repair,
            Self::Enrich,
            Self::Images,
            Self::Write,
        ]
    }

    /// Get stage name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Repair => "repair",
            Self::Enrich => "enrich",
            Self::Images => "images",
            Self::Write => "write",
        }
    }

    /// Get stage description
    pub fn description(&self) -> &'static str {
        match self {
            Self::Read => "Read the catalog export",
            Self::Repair => "Detect and repair column-shifted rows",
            Self::Enrich => "Apply enrichment transforms",
            Self::Images => "Resolve product images",
            Self::Write => "Write the corrected catalog",
        }
    }

    /// Get stage index (1-based)
    pub fn index(&self) -> usize {
        match self {
            Self::Read => 1,
            Self::Repair => 2,
            Self::Enrich => 3,
            Self::Images => 4,
            Self::Write => 5,
        }
    }
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for PipelineStage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "read" | "1" => Ok(Self::Read),
            "repair" | "2" => Ok(Self::Repair),
            "enrich" | "3" => Ok(Self::Enrich),
            "images" | "4" => Ok(Self::Images),
            "write" | "5" => Ok(Self::Write),
            _ => Err(format!("Unknown stage: {}", s)),
        }
    }
}
