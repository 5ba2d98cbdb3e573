//! Import functionality
//!
//! Provides readers that turn catalog exports into a [`Dataset`]:
//! - CSV (product export format, one header line then one row per record)

pub mod csv;

use std::path::PathBuf;

use crate::models::{Dataset, RecordIssue};

/// Result of an import operation
#[derive(Debug)]
pub struct ImportResult {
    /// Records in source order, malformed rows included
    pub dataset: Dataset,
    /// Rows that did not parse cleanly against the header
    pub issues: Vec<RecordIssue>,
}

impl ImportResult {
    /// Number of rows flagged as malformed
    pub fn malformed_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|issue| matches!(issue, RecordIssue::MalformedInput { .. }))
            .count()
    }
}

/// Error during import
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("Input has no header line")]
    EmptyInput,
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("CSV error: {0}")]
    Csv(#[from] ::csv::Error),
}

pub use self::csv::CsvImporter;
