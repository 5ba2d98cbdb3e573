//! Run command implementation

use std::path::PathBuf;

use crate::cli::commands::load_catalog_config;
use crate::cli::error::CliError;
use crate::cli::output::format_issues;
use crate::pipeline::{PipelineConfig, PipelineExecutor, PipelineStage};

/// Arguments for the `run` command
#[derive(Debug, Clone, Default)]
pub struct RunArgs {
    pub input: PathBuf,
    pub output: Option<PathBuf>,
    pub config: Option<PathBuf>,
    pub authoritative: Option<PathBuf>,
    pub assets: Option<PathBuf>,
    pub base_url: Option<String>,
    pub image_report: Option<PathBuf>,
    pub summary: Option<PathBuf>,
    pub stages: Vec<String>,
    pub scan_all: bool,
    pub dry_run: bool,
    pub verbose: bool,
    /// Maximum issues printed after the summary
    pub issue_limit: usize,
}

/// Handle the run command
pub fn handle_run(args: &RunArgs) -> Result<(), CliError> {
    let stages: Vec<PipelineStage> = args
        .stages
        .iter()
        .map(|s| s.parse::<PipelineStage>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(CliError::InvalidArgument)?;

    let catalog = load_catalog_config(args.config.as_deref())?;

    let mut config = PipelineConfig::new()
        .with_input(&args.input)
        .with_stages(stages)
        .with_scan_all(args.scan_all)
        .with_dry_run(args.dry_run)
        .with_verbose(args.verbose)
        .with_catalog(catalog);

    if let Some(output) = &args.output {
        config = config.with_output(output);
    }
    if let Some(path) = &args.authoritative {
        config = config.with_authoritative_images(path);
    }
    if let Some(path) = &args.assets {
        config = config.with_asset_dir(path);
    }
    if let Some(url) = &args.base_url {
        config = config.with_base_url(url);
    }
    if let Some(path) = &args.image_report {
        config = config.with_image_report(path);
    }
    if let Some(path) = &args.summary {
        config = config.with_summary(path);
    }

    if args.verbose {
        eprintln!("Catalog repair");
        eprintln!("==============");
        eprintln!("Input: {}", args.input.display());
        if let Some(output) = &args.output {
            eprintln!("Output: {}", output.display());
        }
        let names: Vec<&str> = config.effective_stages().iter().map(|s| s.name()).collect();
        eprintln!("Stages: {}", names.join(", "));
        if args.dry_run {
            eprintln!("Mode: DRY RUN");
        }
        eprintln!();
    }

    let mut executor = PipelineExecutor::new(config)?;
    let report = executor.run()?;

    report.print_summary();
    eprint!("{}", format_issues(&report.issues, args.issue_limit));

    if report.dry_run {
        eprintln!("\nDry run: no files were written.");
    } else if let Some(output) = &report.output {
        eprintln!("\nCatalog written to {}", output);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_unknown_stage_is_rejected() {
        let args = RunArgs {
            input: PathBuf::from("products.csv"),
            stages: vec!["polish".to_string()],
            ..Default::default()
        };
        let err = handle_run(&args).unwrap_err();
        assert!(matches!(err, CliError::InvalidArgument(_)));
    }

    #[test]
    fn test_run_writes_catalog() {
        let temp = TempDir::new().unwrap();
        let input = temp.path().join("products.csv");
        std::fs::write(
            &input,
            "Handle,Title,Variant SKU,Variant Price\nlid-wipes,Lid Wipes,ECOC-LW,18.00\n",
        )
        .unwrap();
        let output = temp.path().join("fixed.csv");

        let args = RunArgs {
            input,
            output: Some(output.clone()),
            issue_limit: 10,
            ..Default::default()
        };
        handle_run(&args).unwrap();
        let written = std::fs::read_to_string(&output).unwrap();
        assert!(written.starts_with("Handle,Title"));
        assert!(written.contains("lid-wipes"));
    }
}
