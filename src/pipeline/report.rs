//! Run reports
//!
//! Every run ends with a [`PipelineReport`]: counts an operator can use to
//! judge the output without re-deriving it, plus every per-record issue.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::config::PipelineStage;
use super::error::{PipelineError, PipelineResult};
use crate::export::write_atomic;
use crate::images::ImageReport;
use crate::models::RecordIssue;

/// Summary counts for one run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub rows_read: usize,
    pub rows_written: usize,
    pub malformed: usize,
    pub repaired: usize,
    /// Anomalous rows passed through unmodified
    pub flagged: usize,
    pub images_authoritative: usize,
    pub images_local: usize,
    pub images_retained: usize,
    pub images_unmatched: usize,
    pub image_rows_added: usize,
    pub prices_corrected: usize,
    pub lookup_misses: usize,
    pub rows_deactivated: usize,
    pub tags_added: usize,
    pub weights_set: usize,
    pub status_defaulted: usize,
    pub seo_filled: usize,
    pub inventory_defaulted: usize,
}

impl RunSummary {
    pub fn images_matched(&self) -> usize {
        self.images_authoritative + self.images_local
    }

    pub(crate) fn record_images(&mut self, images: &ImageReport) {
        self.images_authoritative = images.matched_authoritative;
        self.images_local = images.matched_local;
        self.images_retained = images.retained;
        self.images_unmatched = images.unmatched;
        self.image_rows_added = images.rows_added;
    }
}

/// Timing of one stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageOutcome {
    pub stage: PipelineStage,
    pub duration_ms: u64,
    /// Why the stage did not run
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skipped: Option<String>,
}

/// Report from a pipeline run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineReport {
    /// Run ID
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    /// Total duration in milliseconds
    pub duration_ms: u64,
    pub dry_run: bool,
    pub input: Option<String>,
    pub output: Option<String>,
    /// SHA-256 of the input bytes
    pub input_digest: Option<String>,
    /// SHA-256 of the effective configuration
    pub config_hash: String,
    pub stages: Vec<StageOutcome>,
    pub summary: RunSummary,
    pub issues: Vec<RecordIssue>,
}

impl PipelineReport {
    pub fn new(run_id: impl Into<String>, config_hash: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
            started_at: Utc::now(),
            duration_ms: 0,
            dry_run: false,
            input: None,
            output: None,
            input_digest: None,
            config_hash: config_hash.into(),
            stages: Vec::new(),
            summary: RunSummary::default(),
            issues: Vec::new(),
        }
    }

    /// Stages that actually ran
    pub fn stages_completed(&self) -> Vec<PipelineStage> {
        self.stages
            .iter()
            .filter(|outcome| outcome.skipped.is_none())
            .map(|outcome| outcome.stage)
            .collect()
    }

    /// No flagged rows, malformed lines, or lookup misses
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    /// Number of issues of one kind, e.g. `"missing_lookup"`
    pub fn issue_count(&self, kind: &str) -> usize {
        self.issues.iter().filter(|issue| issue.kind() == kind).count()
    }

    /// Get formatted duration
    pub fn duration_formatted(&self) -> String {
        let secs = self.duration_ms / 1000;
        let mins = secs / 60;
        let remaining_secs = secs % 60;

        if mins > 0 {
            format!("{}m {}s", mins, remaining_secs)
        } else if secs > 0 {
            format!("{}s", secs)
        } else {
            format!("{}ms", self.duration_ms)
        }
    }

    /// Print summary to stderr
    pub fn print_summary(&self) {
        let s = &self.summary;
        eprintln!();
        eprintln!(
            "Pipeline {}{}",
            self.run_id,
            if self.dry_run { " (dry run)" } else { "" }
        );
        eprintln!("Duration: {}", self.duration_formatted());
        for outcome in &self.stages {
            match &outcome.skipped {
                Some(reason) => eprintln!("  - {}: skipped ({})", outcome.stage, reason),
                None => eprintln!("  - {}: ok ({}ms)", outcome.stage, outcome.duration_ms),
            }
        }
        eprintln!("Rows read:          {}", s.rows_read);
        eprintln!("Rows written:       {}", s.rows_written);
        eprintln!("Malformed rows:     {}", s.malformed);
        eprintln!("Rows repaired:      {}", s.repaired);
        eprintln!("Rows flagged:       {}", s.flagged);
        eprintln!(
            "Images matched:     {} ({} authoritative, {} local)",
            s.images_matched(),
            s.images_authoritative,
            s.images_local
        );
        eprintln!("Images retained:    {}", s.images_retained);
        eprintln!("Images unmatched:   {}", s.images_unmatched);
        eprintln!("Prices corrected:   {}", s.prices_corrected);
        eprintln!("Lookup misses:      {}", s.lookup_misses);
        eprintln!("Rows deactivated:   {}", s.rows_deactivated);
        if !self.issues.is_empty() {
            eprintln!("Issues: {}", self.issues.len());
        }
    }

    /// Save as pretty JSON, atomically
    pub fn save(&self, path: &Path) -> PipelineResult<()> {
        let json = serde_json::to_string_pretty(self)?;
        write_atomic(path, |file| {
            use std::io::Write;
            file.write_all(json.as_bytes())?;
            Ok(())
        })?;
        Ok(())
    }

    /// Load a saved report
    pub fn load(path: &Path) -> PipelineResult<Self> {
        if !path.exists() {
            return Err(PipelineError::FileNotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)
            .map_err(|e| PipelineError::io_with_path(path, "reading report", e))?;
        Ok(serde_json::from_str(&content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_duration_formatted() {
        let mut report = PipelineReport::new("run-1", "hash");
        report.duration_ms = 65_000;
        assert_eq!(report.duration_formatted(), "1m 5s");
        report.duration_ms = 2_400;
        assert_eq!(report.duration_formatted(), "2s");
        report.duration_ms = 12;
        assert_eq!(report.duration_formatted(), "12ms");
    }

    #[test]
    fn test_report_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("summary.json");

        let mut report = PipelineReport::new("run-2", "abc");
        report.summary.rows_read = 3;
        report.summary.repaired = 1;
        report.stages.push(StageOutcome {
            stage: PipelineStage::Images,
            duration_ms: 0,
            skipped: Some("No image sources configured".into()),
        });
        report.issues.push(RecordIssue::AssetNotFound {
            line: 4,
            handle: "widget-b".into(),
        });
        report.save(&path).unwrap();

        let json = std::fs::read_to_string(&path).unwrap();
        assert!(json.contains("\"kind\": \"asset_not_found\""));

        let loaded = PipelineReport::load(&path).unwrap();
        assert_eq!(loaded.summary, report.summary);
        assert_eq!(loaded.issues, report.issues);
        assert!(loaded.stages_completed().is_empty());
        assert_eq!(loaded.issue_count("asset_not_found"), 1);
        assert!(!loaded.is_clean());
    }

    #[test]
    fn test_load_missing_report() {
        let err = PipelineReport::load(Path::new("/nonexistent/summary.json")).unwrap_err();
        assert!(matches!(err, PipelineError::FileNotFound(_)));
    }
}
