//! CLI error types

use thiserror::Error;

use crate::config::ConfigError;
use crate::images::ImageError;
use crate::import::ImportError;
use crate::pipeline::PipelineError;

/// Errors surfaced by CLI commands; every variant exits with status 1
#[derive(Error, Debug)]
pub enum CliError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Import error: {0}")]
    Import(#[from] ImportError),

    #[error("Image error: {0}")]
    Images(#[from] ImageError),

    #[error("Collection sync error: {0}")]
    Collections(String),

    #[error("This command requires the '{0}' feature")]
    FeatureDisabled(&'static str),
}

impl CliError {
    /// Message for stderr, with hints where one helps
    pub fn user_message(&self) -> String {
        match self {
            CliError::Pipeline(err) => err.user_message(),
            CliError::Config(err) => {
                format!("Config error: {err}\n\nHint: Config files must end in .toml, .yaml or .yml.")
            }
            CliError::FeatureDisabled(feature) => format!(
                "This command requires the '{feature}' feature.\n\nHint: Rebuild with --features {feature}."
            ),
            _ => self.to_string(),
        }
    }
}
