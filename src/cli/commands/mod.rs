//! CLI command implementations

pub mod collections;
pub mod images;
pub mod inspect;
pub mod run;

use std::path::Path;

use crate::cli::error::CliError;
use crate::config::CatalogConfig;

/// Load a catalog config file, or the built-in defaults when none is given
pub(crate) fn load_catalog_config(path: Option<&Path>) -> Result<CatalogConfig, CliError> {
    match path {
        Some(path) => {
            if !path.exists() {
                return Err(CliError::InvalidArgument(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            Ok(CatalogConfig::load(path)?)
        }
        None => Ok(CatalogConfig::default()),
    }
}

/// Reject a missing input path before doing any work
pub(crate) fn require_input(path: &Path) -> Result<(), CliError> {
    if path.exists() {
        Ok(())
    } else {
        Err(CliError::InvalidArgument(format!(
            "Input file not found: {}",
            path.display()
        )))
    }
}
