//! Inspect command implementation

use std::path::PathBuf;

use crate::cli::commands::{load_catalog_config, require_input};
use crate::cli::error::CliError;
use crate::cli::output::{InspectedRow, format_inspection, format_issues};
use crate::import::CsvImporter;
use crate::models::GroupContext;
use crate::validation::{AllowList, AnomalyDetector, Detection};

/// Arguments for the `inspect` command
#[derive(Debug, Clone, Default)]
pub struct InspectArgs {
    pub input: PathBuf,
    pub config: Option<PathBuf>,
    pub scan_all: bool,
    pub json: bool,
}

/// Report anomalous rows without changing anything
pub fn handle_inspect(args: &InspectArgs) -> Result<(), CliError> {
    require_input(&args.input)?;
    let catalog = load_catalog_config(args.config.as_deref())?;
    let mut detector = AnomalyDetector::from_config(&catalog.detection)?;
    if args.scan_all {
        detector = detector.with_allow_list(AllowList::any());
    }

    let imported = CsvImporter::new().read_path(&args.input)?;
    let rows = inspect_rows(&detector, &imported.dataset.records);
    let out_of_scope = rows.iter().filter(|r| r.detection == Detection::OutOfScope).count();
    let anomalous: Vec<InspectedRow> = rows
        .into_iter()
        .filter(|r| r.detection.is_anomalous())
        .collect();

    if args.json {
        let entries: Vec<serde_json::Value> = anomalous
            .iter()
            .map(|row| {
                serde_json::json!({
                    "line": row.line,
                    "handle": row.handle,
                    "detection": describe(&row.detection),
                })
            })
            .collect();
        let body = serde_json::json!({
            "rows": imported.dataset.len(),
            "malformed": imported.malformed_count(),
            "out_of_scope": out_of_scope,
            "anomalies": entries,
        });
        let text = serde_json::to_string_pretty(&body)
            .map_err(|e| CliError::InvalidArgument(format!("Failed to serialize output: {}", e)))?;
        println!("{}", text);
        return Ok(());
    }

    print!(
        "{}",
        format_inspection(&anomalous, imported.dataset.len(), out_of_scope)
    );
    print!("{}", format_issues(&imported.issues, 20));
    Ok(())
}

fn inspect_rows(detector: &AnomalyDetector, records: &[crate::models::Record]) -> Vec<InspectedRow> {
    let mut current = None;
    records
        .iter()
        .map(|record| {
            let ctx = GroupContext::advance(&mut current, record);
            InspectedRow {
                line: record.line,
                handle: record.handle().to_string(),
                detection: detector.detect(record, &ctx),
            }
        })
        .collect()
}

fn describe(detection: &Detection) -> String {
    match detection {
        Detection::Clean => "clean".to_string(),
        Detection::OutOfScope => "out-of-scope".to_string(),
        Detection::Shifted(sig) => format!("shifted:{}", sig.rule),
        Detection::Unrecognised { violations } => {
            format!("unrecognised:{}", violations.join("|"))
        }
    }
}
