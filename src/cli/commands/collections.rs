//! Collections command implementation

use std::path::PathBuf;

use crate::cli::commands::require_input;
use crate::cli::error::CliError;
use crate::collections::{CollectionSpec, SyncReport};
use crate::import::CsvImporter;

/// Arguments for the `collections` command
#[derive(Debug, Clone, Default)]
pub struct CollectionsArgs {
    /// An enriched catalog; tags are read from its primary rows
    pub input: PathBuf,
    pub store: Option<String>,
    pub token: Option<String>,
    pub delay_ms: u64,
    pub dry_run: bool,
}

/// Create one storefront collection per product tag
pub fn handle_collections(args: &CollectionsArgs) -> Result<(), CliError> {
    require_input(&args.input)?;
    let dataset = CsvImporter::new().read_path(&args.input)?.dataset;
    let specs = CollectionSpec::from_dataset(&dataset);

    if specs.is_empty() {
        eprintln!("No tags found; nothing to create.");
        return Ok(());
    }

    if args.dry_run {
        eprintln!("Would create {} collection(s):", specs.len());
        for spec in &specs {
            println!("{}\t{}", spec.handle, spec.title);
        }
        return Ok(());
    }

    let report = sync(args, &specs)?;
    eprintln!("Created:  {}", report.created);
    eprintln!("Existing: {}", report.existing);
    if !report.failed.is_empty() {
        eprintln!("Failed:   {} ({})", report.failed.len(), report.failed.join(", "));
        return Err(CliError::Collections(format!(
            "{} collection(s) could not be created",
            report.failed.len()
        )));
    }
    Ok(())
}

#[cfg(feature = "admin-api")]
fn sync(args: &CollectionsArgs, specs: &[CollectionSpec]) -> Result<SyncReport, CliError> {
    use crate::collections::{AdminApiClient, CollectionSync};
    use std::time::Duration;

    let store = args
        .store
        .as_deref()
        .ok_or_else(|| CliError::InvalidArgument("--store is required".to_string()))?;
    let token = args
        .token
        .clone()
        .ok_or_else(|| CliError::InvalidArgument("an access token is required".to_string()))?;
    let client =
        AdminApiClient::new(store, token).map_err(|e| CliError::Collections(e.to_string()))?;
    Ok(CollectionSync::new(Duration::from_millis(args.delay_ms)).run(&client, specs))
}

#[cfg(not(feature = "admin-api"))]
fn sync(_args: &CollectionsArgs, _specs: &[CollectionSpec]) -> Result<SyncReport, CliError> {
    Err(CliError::FeatureDisabled("admin-api"))
}
