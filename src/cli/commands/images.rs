//! Images command implementation

use std::path::PathBuf;

use crate::cli::commands::{load_catalog_config, require_input};
use crate::cli::error::CliError;
use crate::images::{AuthoritativeImages, ImageExpansion, ImageResolver, LocalAssetDirectory};
use crate::import::CsvImporter;

/// Arguments for the `images` command
#[derive(Debug, Clone, Default)]
pub struct ImagesArgs {
    pub input: PathBuf,
    pub config: Option<PathBuf>,
    pub authoritative: Option<PathBuf>,
    pub assets: Option<PathBuf>,
    pub base_url: Option<String>,
    pub report: PathBuf,
}

/// Resolve images for a catalog and write only the mapping report
pub fn handle_images(args: &ImagesArgs) -> Result<(), CliError> {
    require_input(&args.input)?;
    if args.authoritative.is_none() && args.assets.is_none() {
        return Err(CliError::InvalidArgument(
            "At least one of --authoritative or --assets is required".to_string(),
        ));
    }
    let catalog = load_catalog_config(args.config.as_deref())?;

    let authoritative = match &args.authoritative {
        Some(path) => AuthoritativeImages::from_path(path)?,
        None => AuthoritativeImages::default(),
    };
    let local = match &args.assets {
        Some(path) => LocalAssetDirectory::from_dir(path)?,
        None => LocalAssetDirectory::default(),
    };
    let base_url = args
        .base_url
        .clone()
        .unwrap_or_else(|| catalog.images.base_url.clone());

    eprintln!(
        "Loaded {} authoritative handle(s) and {} local asset(s)",
        authoritative.len(),
        local.len()
    );

    let resolver = ImageResolver::new(authoritative, local, base_url);
    let expansion = ImageExpansion::new(resolver, &catalog.images)?;

    let mut dataset = CsvImporter::new().read_path(&args.input)?.dataset;
    let report = expansion.expand(&mut dataset);
    report.write_csv(&args.report)?;

    eprintln!("Authoritative: {}", report.matched_authoritative);
    eprintln!("Local:         {}", report.matched_local);
    eprintln!("Retained:      {}", report.retained);
    eprintln!("Unmatched:     {}", report.unmatched);
    eprintln!("\nImage mapping written to {}", args.report.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_requires_a_source() {
        let temp = TempDir::new().unwrap();
        let input = temp.path().join("products.csv");
        std::fs::write(&input, "Handle,Title\nwidget-a,Widget A\n").unwrap();
        let args = ImagesArgs {
            input,
            report: temp.path().join("map.csv"),
            ..Default::default()
        };
        assert!(matches!(
            handle_images(&args),
            Err(CliError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_writes_mapping_for_local_assets() {
        let temp = TempDir::new().unwrap();
        let input = temp.path().join("products.csv");
        std::fs::write(&input, "Handle,Title,Image Src\nwidget-a,Widget A,\n").unwrap();
        let assets = temp.path().join("assets");
        std::fs::create_dir(&assets).unwrap();
        std::fs::write(assets.join("widget-a.png"), b"png").unwrap();
        let report = temp.path().join("map.csv");

        let args = ImagesArgs {
            input,
            assets: Some(assets),
            base_url: Some("https://cdn.test/img".to_string()),
            report: report.clone(),
            ..Default::default()
        };
        handle_images(&args).unwrap();

        let text = std::fs::read_to_string(&report).unwrap();
        assert!(text.contains("widget-a,local,1,https://cdn.test/img/widget-a.png"));
    }
}
