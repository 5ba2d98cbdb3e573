//! Export functionality
//!
//! Provides writers for the final catalog:
//! - CSV (same shape as the import, with the accumulated header)

pub mod csv;

use std::path::PathBuf;

/// Result of an export operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportResult {
    /// Destination path (None for in-memory writers)
    pub path: Option<PathBuf>,
    /// Data rows written, header excluded
    pub rows: usize,
    /// Header width
    pub fields: usize,
}

/// Error during export
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("Cannot write output {path}: {source}")]
    OutputWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("CSV error: {0}")]
    Csv(#[from] ::csv::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ExportError {
    pub(crate) fn output(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ExportError::OutputWrite {
            path: path.into(),
            source,
        }
    }
}

pub use self::csv::{CsvExporter, write_atomic};
