//! Catalog repair pipeline
//!
//! This module runs the full batch over one catalog export:
//! - Read the export, keeping malformed rows as repair candidates
//! - Detect and repair column-shifted rows
//! - Apply enrichment transforms (tags, weight, price, status, SEO, inventory)
//! - Resolve product images, expanding rows for multi-image products
//! - Write the corrected catalog, the image mapping and a JSON run report
//!
//! # Example
//!
//! ```rust,ignore
//! use catalog_repair::pipeline::{PipelineConfig, PipelineExecutor};
//!
//! let config = PipelineConfig::new()
//!     .with_input("products_export.csv")
//!     .with_output("products_fixed.csv")
//!     .with_asset_dir("processed_images")
//!     .with_image_report("image_mapping.csv");
//!
//! let mut executor = PipelineExecutor::new(config)?;
//! let report = executor.run()?;
//! report.print_summary();
//! ```
//!
//! # Failure model
//!
//! Per-record problems (malformed lines, unrepaired anomalies, lookup misses,
//! missing images) are collected in the report and never abort the run. Only
//! an unreadable input or an unwritable output does; outputs are written to a
//! temporary file and renamed, so a failed run leaves the destination as it
//! was.
//!
//! # Dry Run
//!
//! With `with_dry_run(true)` the input is read and transformed and the report
//! is produced, but nothing is written.

mod config;
mod error;
mod executor;
mod report;

pub use config::{PipelineConfig, PipelineStage};
pub use error::{PipelineError, PipelineResult};
pub use executor::{PipelineExecutor, PipelineOutput};
pub use report::{PipelineReport, RunSummary, StageOutcome};

/// Run a pipeline with the given configuration
///
/// This is a convenience function for simple pipeline execution.
pub fn run_pipeline(config: PipelineConfig) -> PipelineResult<PipelineReport> {
    let mut executor = PipelineExecutor::new(config)?;
    executor.run()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_run_pipeline_dry_run() {
        let temp = TempDir::new().unwrap();
        let input = temp.path().join("products.csv");
        std::fs::write(
            &input,
            "Handle,Title,Variant SKU,Variant Price\nlid-wipes,Lid Wipes,ECOC-LW,18.00\n",
        )
        .unwrap();
        let output = temp.path().join("fixed.csv");

        let config = PipelineConfig::new()
            .with_input(&input)
            .with_output(&output)
            .with_summary(temp.path().join("summary.json"))
            .with_dry_run(true);

        let report = run_pipeline(config).unwrap();
        assert!(report.dry_run);
        assert_eq!(report.summary.rows_read, 1);
        assert_eq!(report.summary.rows_written, 0);
        assert!(!output.exists());
        assert!(!temp.path().join("summary.json").exists());
    }
}
