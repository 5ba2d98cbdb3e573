//! Error types for pipeline runs
//!
//! Only run-level failures live here: a missing or unreadable input, bad
//! lookup tables, or an output that cannot be written. Problems with single
//! records are collected as [`crate::models::RecordIssue`]s instead and never
//! abort a run.

use std::path::PathBuf;
use thiserror::Error;

use crate::config::ConfigError;
use crate::export::ExportError;
use crate::images::ImageError;
use crate::import::ImportError;

/// Errors that abort a pipeline run
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Pipeline configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Lookup tables failed to load or compile
    #[error("Catalog config error: {0}")]
    Catalog(#[from] ConfigError),

    /// Missing required input
    #[error("Missing required input: {0}")]
    MissingInput(String),

    /// File not found
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// Input catalog could not be read
    #[error("Import failed: {0}")]
    Import(#[from] ImportError),

    /// Image sources could not be loaded or the mapping report written
    #[error("Image stage failed: {0}")]
    Images(#[from] ImageError),

    /// Output catalog could not be written
    #[error("Output failed: {0}")]
    OutputWrite(#[from] ExportError),

    /// IO error with path context
    #[error("IO error with {path}: {message}")]
    IoErrorWithPath {
        path: PathBuf,
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// JSON error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Result type for pipeline operations
pub type PipelineResult<T> = Result<T, PipelineError>;

impl PipelineError {
    /// Create an IO error with path context
    pub fn io_with_path(
        path: impl Into<PathBuf>,
        message: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        Self::IoErrorWithPath {
            path: path.into(),
            message: message.into(),
            source,
        }
    }

    /// Whether the failure happened while writing results
    pub fn is_output_failure(&self) -> bool {
        matches!(
            self,
            PipelineError::OutputWrite(_) | PipelineError::Images(ImageError::Export(_))
        )
    }

    /// Get a user-friendly error message for CLI output
    pub fn user_message(&self) -> String {
        match self {
            PipelineError::ConfigError(msg) => {
                format!("Configuration error: {msg}\n\nHint: Check the command-line options.")
            }
            PipelineError::Catalog(err) => {
                format!(
                    "Catalog config error: {err}\n\nHint: Check the lookup tables passed with --config."
                )
            }
            PipelineError::MissingInput(input) => {
                format!(
                    "Missing required input: {input}\n\nHint: Ensure all required files exist and paths are correct."
                )
            }
            PipelineError::FileNotFound(path) => {
                format!(
                    "File not found: {}\n\nHint: Check that the file exists and the path is correct.",
                    path.display()
                )
            }
            PipelineError::OutputWrite(err) => {
                format!(
                    "Output failed: {err}\n\nHint: Check that the destination directory exists and is writable. The input file was not modified."
                )
            }
            _ => self.to_string(),
        }
    }
}
