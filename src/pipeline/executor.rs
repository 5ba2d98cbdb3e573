//! Pipeline executor for running the full catalog repair

use std::path::Path;
use std::time::Instant;

use sha2::{Digest, Sha256};
use tracing::{debug, info, info_span, warn};
use uuid::Uuid;

use super::config::{PipelineConfig, PipelineStage};
use super::error::{PipelineError, PipelineResult};
use super::report::{PipelineReport, StageOutcome};
use crate::enrich::Enricher;
use crate::export::CsvExporter;
use crate::images::{AuthoritativeImages, ImageExpansion, ImageReport, ImageResolver, LocalAssetDirectory};
use crate::import::CsvImporter;
use crate::models::{Dataset, GroupContext, RecordIssue};
use crate::repair::{RepairOutcome, RowRepairer};
use crate::validation::{AllowList, AnomalyDetector, Detection};

/// Transformed dataset and report from an in-memory run
#[derive(Debug)]
pub struct PipelineOutput {
    pub dataset: Dataset,
    pub report: PipelineReport,
}

/// Pipeline executor that runs all stages
pub struct PipelineExecutor {
    config: PipelineConfig,
    run_id: String,
    config_hash: String,
    detector: AnomalyDetector,
    enricher: Enricher,
    resolver: Option<ImageResolver>,
}

impl PipelineExecutor {
    /// Create a new pipeline executor
    ///
    /// Lookup tables are compiled here so bad patterns fail before any
    /// input is read.
    pub fn new(config: PipelineConfig) -> PipelineResult<Self> {
        config.validate().map_err(PipelineError::ConfigError)?;

        let mut detector = AnomalyDetector::from_config(&config.catalog.detection)?;
        if config.scan_all {
            detector = detector.with_allow_list(AllowList::any());
        }
        // Compile image patterns up front as well.
        ImageExpansion::new(ImageResolver::default(), &config.catalog.images)?;

        let enricher = Enricher::from_config(&config.catalog);
        let config_hash = Self::hash_config(&config);
        let run_id = Uuid::new_v4().to_string();

        Ok(Self {
            config,
            run_id,
            config_hash,
            detector,
            enricher,
            resolver: None,
        })
    }

    /// Use a prepared resolver instead of loading image sources from disk
    pub fn with_resolver(mut self, resolver: ImageResolver) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run the pipeline from the configured input file
    pub fn run(&mut self) -> PipelineResult<PipelineReport> {
        let _span = info_span!(
            "pipeline_run",
            run_id = %self.run_id,
            dry_run = self.config.dry_run
        )
        .entered();

        let start = Instant::now();
        let stages = self.config.effective_stages();

        info!(
            run_id = %self.run_id,
            stages = ?stages.iter().map(|s| s.name()).collect::<Vec<_>>(),
            dry_run = self.config.dry_run,
            "Starting pipeline"
        );

        if self.config.verbose {
            eprintln!("Pipeline run: {}", self.run_id);
            eprintln!(
                "Stages to run: {:?}",
                stages.iter().map(|s| s.name()).collect::<Vec<_>>()
            );
            if self.config.dry_run {
                eprintln!("DRY RUN MODE - no files will be written");
            }
        }

        let mut report = self.new_report();
        let mut dataset = self.timed(PipelineStage::Read, &mut report, |this, report| {
            this.run_read(report)
        })?;

        let images = self.transform(&mut dataset, &stages, &mut report)?;

        if stages.contains(&PipelineStage::Write) {
            if self.config.dry_run {
                self.skip(PipelineStage::Write, "dry run", &mut report);
            } else {
                self.timed(PipelineStage::Write, &mut report, |this, report| {
                    this.run_write(&dataset, images.as_ref(), report)
                })?;
            }
        }
        report.duration_ms = start.elapsed().as_millis() as u64;

        info!(
            run_id = %self.run_id,
            duration_ms = report.duration_ms,
            rows = report.summary.rows_written,
            issues = report.issues.len(),
            "Pipeline completed"
        );

        if let Some(path) = &self.config.summary {
            if !self.config.dry_run {
                report.save(path)?;
                debug!(path = %path.display(), "Saved run report");
            }
        }

        Ok(report)
    }

    /// Run every selected transform stage on an in-memory dataset.
    ///
    /// Nothing is read or written; the Read and Write stages are skipped.
    pub fn run_on_dataset(&self, mut dataset: Dataset) -> PipelineResult<PipelineOutput> {
        let _span = info_span!("pipeline_run", run_id = %self.run_id, in_memory = true).entered();
        let start = Instant::now();

        let mut report = self.new_report();
        report.summary.rows_read = dataset.len();
        let stages = self.config.effective_stages();
        self.transform(&mut dataset, &stages, &mut report)?;
        report.summary.rows_written = dataset.len();
        report.duration_ms = start.elapsed().as_millis() as u64;

        Ok(PipelineOutput { dataset, report })
    }

    fn new_report(&self) -> PipelineReport {
        let mut report = PipelineReport::new(&self.run_id, &self.config_hash);
        report.dry_run = self.config.dry_run;
        report.input = self.config.input.as_ref().map(|p| p.display().to_string());
        report.output = self.config.output.as_ref().map(|p| p.display().to_string());
        report
    }

    /// Repair, enrich and resolve images, in stage order
    fn transform(
        &self,
        dataset: &mut Dataset,
        stages: &[PipelineStage],
        report: &mut PipelineReport,
    ) -> PipelineResult<Option<ImageReport>> {
        let mut images = None;
        for stage in stages {
            match stage {
                PipelineStage::Read | PipelineStage::Write => {}
                PipelineStage::Repair => {
                    self.timed(*stage, report, |this, report| {
                        this.run_repair(dataset, report);
                        Ok(())
                    })?;
                }
                PipelineStage::Enrich => {
                    self.timed(*stage, report, |this, report| {
                        this.run_enrich(dataset, report);
                        Ok(())
                    })?;
                }
                PipelineStage::Images => {
                    if let Some(reason) = self.should_skip_stage(*stage) {
                        self.skip(*stage, &reason, report);
                        continue;
                    }
                    images = Some(self.timed(*stage, report, |this, report| {
                        this.run_images(dataset, report)
                    })?);
                }
            }
        }
        Ok(images)
    }

    /// Run one stage inside its span and record its timing
    fn timed<T>(
        &self,
        stage: PipelineStage,
        report: &mut PipelineReport,
        body: impl FnOnce(&Self, &mut PipelineReport) -> PipelineResult<T>,
    ) -> PipelineResult<T> {
        let _stage_span = info_span!("pipeline_stage", stage = stage.name()).entered();
        info!(stage = stage.name(), "Starting stage");
        if self.config.verbose {
            eprintln!("Running stage {}...", stage.name());
        }

        let start = Instant::now();
        let value = body(self, report)?;
        let duration_ms = start.elapsed().as_millis() as u64;

        info!(stage = stage.name(), duration_ms, "Stage completed");
        if self.config.verbose {
            eprintln!("Stage {} completed in {}ms", stage.name(), duration_ms);
        }
        report.stages.push(StageOutcome {
            stage,
            duration_ms,
            skipped: None,
        });
        Ok(value)
    }

    fn skip(&self, stage: PipelineStage, reason: &str, report: &mut PipelineReport) {
        debug!(stage = stage.name(), reason = %reason, "Skipping stage");
        if self.config.verbose {
            eprintln!("Skipping stage {}: {}", stage.name(), reason);
        }
        report.stages.push(StageOutcome {
            stage,
            duration_ms: 0,
            skipped: Some(reason.to_string()),
        });
    }

    /// Check if a stage should be skipped
    fn should_skip_stage(&self, stage: PipelineStage) -> Option<String> {
        match stage {
            PipelineStage::Images if self.resolver.is_none() && !self.config.has_image_sources() => {
                Some("No image sources configured".to_string())
            }
            _ => None,
        }
    }

    /// Read the input catalog
    fn run_read(&self, report: &mut PipelineReport) -> PipelineResult<Dataset> {
        let input = self
            .config
            .input
            .as_ref()
            .ok_or_else(|| PipelineError::MissingInput("input catalog".to_string()))?;

        if !input.exists() {
            warn!(input = %input.display(), "Input catalog not found");
            return Err(PipelineError::FileNotFound(input.clone()));
        }

        let bytes = std::fs::read(input)
            .map_err(|e| PipelineError::io_with_path(input, "reading input catalog", e))?;
        report.input_digest = Some(Self::digest(&bytes));

        let result = CsvImporter::new().read(bytes.as_slice())?;
        report.summary.rows_read = result.dataset.len();
        report.summary.malformed = result.malformed_count();
        report.issues.extend(result.issues);

        debug!(
            rows = report.summary.rows_read,
            malformed = report.summary.malformed,
            fields = result.dataset.header().len(),
            "Input read"
        );
        if self.config.verbose {
            eprintln!(
                "  Read {} rows ({} malformed)",
                report.summary.rows_read, report.summary.malformed
            );
        }
        Ok(result.dataset)
    }

    /// Detect column shifts and repair the rows a known rule explains
    fn run_repair(&self, dataset: &mut Dataset, report: &mut PipelineReport) {
        let rules: Vec<_> = self
            .config
            .catalog
            .detection
            .shift_rules
            .iter()
            .collect();
        let repairer = RowRepairer::new(self.detector.shapes(), rules);

        let mut current = None;
        for record in &mut dataset.records {
            let ctx = GroupContext::advance(&mut current, record);
            match self.detector.detect(record, &ctx) {
                Detection::Clean | Detection::OutOfScope => {}
                Detection::Shifted(signature) => match repairer.repair(record, &signature) {
                    RepairOutcome::Repaired(fixed) => {
                        *record = fixed;
                        report.summary.repaired += 1;
                    }
                    rejected @ RepairOutcome::Rejected { .. } => {
                        if let Some(issue) = rejected.issue(&signature) {
                            report.issues.push(issue);
                        }
                        report.summary.flagged += 1;
                    }
                },
                Detection::Unrecognised { violations } => {
                    warn!(
                        line = record.line,
                        handle = record.handle(),
                        fields = ?violations,
                        "Unrepaired anomaly"
                    );
                    report.issues.push(RecordIssue::UnrepairedAnomaly {
                        line: record.line,
                        handle: record.handle().to_string(),
                        fields: violations,
                        reason: "no known shift pattern matches".to_string(),
                    });
                    report.summary.flagged += 1;
                }
            }
        }

        if self.config.verbose {
            eprintln!(
                "  Repaired {} rows, flagged {}",
                report.summary.repaired, report.summary.flagged
            );
        }
    }

    fn run_enrich(&self, dataset: &mut Dataset, report: &mut PipelineReport) {
        let enrich = self.enricher.apply(dataset);
        let summary = &mut report.summary;
        summary.tags_added = enrich.changed("tags");
        summary.weights_set = enrich.changed("weight");
        summary.prices_corrected = enrich.changed("price");
        summary.status_defaulted = enrich.changed("status");
        summary.rows_deactivated = enrich.changed("deactivation");
        summary.seo_filled = enrich.changed("seo");
        summary.inventory_defaulted = enrich.changed("inventory");
        summary.lookup_misses = enrich.missed();
        report.issues.extend(enrich.issues);
    }

    fn run_images(&self, dataset: &mut Dataset, report: &mut PipelineReport) -> PipelineResult<ImageReport> {
        let resolver = match &self.resolver {
            Some(resolver) => resolver.clone(),
            None => self.load_resolver()?,
        };
        let expansion = ImageExpansion::new(resolver, &self.config.catalog.images)?;
        let mut images = expansion.expand(dataset);
        report.summary.record_images(&images);
        report.issues.append(&mut images.issues);

        if self.config.verbose {
            eprintln!(
                "  Images: {} matched, {} retained, {} unmatched",
                images.matched(),
                images.retained,
                images.unmatched
            );
        }
        Ok(images)
    }

    fn load_resolver(&self) -> PipelineResult<ImageResolver> {
        let authoritative = match &self.config.authoritative_images {
            Some(path) => {
                Self::require_exists(path)?;
                AuthoritativeImages::from_path(path)?
            }
            None => AuthoritativeImages::default(),
        };
        let local = match &self.config.asset_dir {
            Some(path) => {
                Self::require_exists(path)?;
                LocalAssetDirectory::from_dir(path)?
            }
            None => LocalAssetDirectory::default(),
        };
        Ok(ImageResolver::new(authoritative, local, self.config.effective_base_url()))
    }

    /// Write the corrected catalog and the image mapping report
    fn run_write(
        &self,
        dataset: &Dataset,
        images: Option<&ImageReport>,
        report: &mut PipelineReport,
    ) -> PipelineResult<()> {
        let output = self
            .config
            .output
            .as_ref()
            .ok_or_else(|| PipelineError::MissingInput("output path".to_string()))?;

        let result = CsvExporter::new().write_path(dataset, output)?;
        report.summary.rows_written = result.rows;
        debug!(output = %output.display(), rows = result.rows, fields = result.fields, "Catalog written");

        if let (Some(path), Some(images)) = (&self.config.image_report, images) {
            images.write_csv(path)?;
            debug!(path = %path.display(), entries = images.entries.len(), "Image report written");
        }
        Ok(())
    }

    fn require_exists(path: &Path) -> PipelineResult<()> {
        if path.exists() {
            Ok(())
        } else {
            Err(PipelineError::FileNotFound(path.to_path_buf()))
        }
    }

    fn digest(bytes: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        format!("{:x}", hasher.finalize())
    }

    /// Hash the config for change detection
    fn hash_config(config: &PipelineConfig) -> String {
        let mut hasher = Sha256::new();
        for path in [
            &config.input,
            &config.output,
            &config.authoritative_images,
            &config.asset_dir,
        ]
        .into_iter()
        .flatten()
        {
            hasher.update(path.display().to_string().as_bytes());
        }
        hasher.update(config.effective_base_url().as_bytes());
        for stage in config.effective_stages() {
            hasher.update(stage.name().as_bytes());
        }
        hasher.update([config.scan_all as u8]);
        hasher.update(config.catalog.digest().as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Header, fields};
    use tempfile::TempDir;

    fn config(dir: &TempDir) -> PipelineConfig {
        PipelineConfig::new()
            .with_input(dir.path().join("products.csv"))
            .with_output(dir.path().join("fixed.csv"))
    }

    #[test]
    fn test_executor_rejects_invalid_config() {
        let result = PipelineExecutor::new(PipelineConfig::new());
        assert!(matches!(result, Err(PipelineError::ConfigError(_))));
    }

    #[test]
    fn test_executor_rejects_bad_patterns() {
        let dir = TempDir::new().unwrap();
        let mut config = config(&dir);
        config.catalog.images.private_patterns = vec!["[".to_string()];
        assert!(matches!(
            PipelineExecutor::new(config),
            Err(PipelineError::Catalog(_))
        ));
    }

    #[test]
    fn test_missing_input_file() {
        let dir = TempDir::new().unwrap();
        let mut executor = PipelineExecutor::new(config(&dir)).unwrap();
        assert!(matches!(executor.run(), Err(PipelineError::FileNotFound(_))));
    }

    #[test]
    fn test_config_hash() {
        let a = PipelineConfig::new().with_input("/data/a.csv");
        let b = PipelineConfig::new().with_input("/data/a.csv");
        let c = PipelineConfig::new().with_input("/data/a.csv").with_scan_all(true);

        assert_eq!(PipelineExecutor::hash_config(&a), PipelineExecutor::hash_config(&b));
        assert_ne!(PipelineExecutor::hash_config(&a), PipelineExecutor::hash_config(&c));
    }

    #[test]
    fn test_run_on_dataset_skips_images_without_sources() {
        let dir = TempDir::new().unwrap();
        let executor = PipelineExecutor::new(config(&dir)).unwrap();

        let mut dataset = Dataset::new(Header::new(fields::STANDARD_HEADER.iter().copied()));
        let row = dataset.push_values(Vec::new(), 2);
        row.set(fields::HANDLE, "eye-care-bundle");
        row.set(fields::TITLE, "Eye Care Bundle");
        row.set(fields::VARIANT_PRICE, "ECOC-BUNDLE-MOD");
        row.set(fields::VARIANT_REQUIRES_SHIPPING, "149.95");

        let output = executor.run_on_dataset(dataset).unwrap();
        let record = &output.dataset.records[0];
        assert_eq!(record.get(fields::VARIANT_SKU), "ECOC-BUNDLE-MOD");
        assert_eq!(record.get(fields::VARIANT_PRICE), "149.95");
        assert_eq!(output.report.summary.repaired, 1);
        assert!(output
            .report
            .stages
            .iter()
            .any(|s| s.stage == PipelineStage::Images && s.skipped.is_some()));
    }
}
