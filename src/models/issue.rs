//! Per-record problems collected during a run
//!
//! None of these abort a run. Each one identifies the offending row by its
//! source line and handle so an operator can follow up by hand.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A non-fatal problem found while processing one record
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RecordIssue {
    /// Line did not split into the header's field count
    #[error("line {line}: malformed input ({reason}): {raw}")]
    MalformedInput {
        line: usize,
        reason: String,
        raw: String,
    },

    /// Row failed shape checks and no known shift pattern applies
    #[error("line {line} ({handle}): unrepaired anomaly in {fields:?}: {reason}")]
    UnrepairedAnomaly {
        line: usize,
        handle: String,
        fields: Vec<String>,
        reason: String,
    },

    /// A lookup table had no entry for the row's key
    #[error("line {line} ({handle}): {table} has no entry for '{key}'")]
    MissingLookup {
        line: usize,
        handle: String,
        table: String,
        key: String,
    },

    /// No image could be resolved for a product
    #[error("line {line} ({handle}): no image found")]
    AssetNotFound { line: usize, handle: String },
}

impl RecordIssue {
    pub fn line(&self) -> usize {
        match self {
            RecordIssue::MalformedInput { line, .. }
            | RecordIssue::UnrepairedAnomaly { line, .. }
            | RecordIssue::MissingLookup { line, .. }
            | RecordIssue::AssetNotFound { line, .. } => *line,
        }
    }

    /// Short machine-friendly kind name
    pub fn kind(&self) -> &'static str {
        match self {
            RecordIssue::MalformedInput { .. } => "malformed_input",
            RecordIssue::UnrepairedAnomaly { .. } => "unrepaired_anomaly",
            RecordIssue::MissingLookup { .. } => "missing_lookup",
            RecordIssue::AssetNotFound { .. } => "asset_not_found",
        }
    }
}
