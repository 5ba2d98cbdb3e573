//! Catalog Repair - batch repair and enrichment for product catalog exports
//!
//! Provides:
//! - CSV import that keeps malformed rows instead of dropping them
//! - Rule-driven detection and repair of column-shifted rows
//! - Enrichment transforms (tags, weight, pricing, status, SEO, inventory)
//! - Image resolution against an authoritative export and a local asset folder
//! - Atomic CSV export and a JSON run report
//! - Storefront collection sync (behind the `admin-api` feature)

pub mod collections;
pub mod config;
pub mod enrich;
pub mod export;
pub mod images;
pub mod import;
pub mod models;
pub mod pipeline;
pub mod repair;
pub mod validation;

#[cfg(feature = "cli")]
pub mod cli;

// Re-export commonly used types
pub use config::{CatalogConfig, ConfigError};
pub use enrich::{EnrichReport, Enricher, Outcome, Transform};
pub use export::{CsvExporter, ExportError, ExportResult};
pub use images::{ImageConfig, ImageError, ImageExpansion, ImageReport, ImageResolver};
pub use import::{CsvImporter, ImportError, ImportResult};
pub use models::{Dataset, GroupContext, Header, Record, RecordIssue};
pub use pipeline::{
    PipelineConfig, PipelineError, PipelineExecutor, PipelineReport, PipelineStage, run_pipeline,
};
pub use repair::{RepairOutcome, RowRepairer};
pub use validation::{AnomalyDetector, Detection, ShiftRule, ShiftSignature};
