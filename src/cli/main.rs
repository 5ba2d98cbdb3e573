//! catalog-repair command line entry point

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt};

use catalog_repair::cli::CliError;
use catalog_repair::cli::commands::collections::{CollectionsArgs, handle_collections};
use catalog_repair::cli::commands::images::{ImagesArgs, handle_images};
use catalog_repair::cli::commands::inspect::{InspectArgs, handle_inspect};
use catalog_repair::cli::commands::run::{RunArgs, handle_run};

#[derive(Parser, Debug)]
#[command(
    name = "catalog-repair",
    version,
    about = "Repair and enrich a product catalog CSV export"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the repair pipeline over a catalog export
    Run(RunCommand),
    /// Report anomalous rows without writing anything
    Inspect {
        #[arg(long)]
        input: PathBuf,
        /// Catalog rules file (.toml, .yaml or .yml)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Inspect every row, not only the allow-listed ones
        #[arg(long, default_value_t = false)]
        scan_all: bool,
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Resolve product images and write the mapping report only
    Images {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        config: Option<PathBuf>,
        /// Export whose Image Src values are authoritative
        #[arg(long)]
        authoritative: Option<PathBuf>,
        /// Directory of processed image files named after handles
        #[arg(long)]
        assets: Option<PathBuf>,
        #[arg(long)]
        base_url: Option<String>,
        #[arg(long = "output-report", default_value = "image_mapping.csv")]
        report: PathBuf,
    },
    /// Create one storefront collection per product tag
    Collections {
        #[arg(long)]
        input: PathBuf,
        /// Store domain or base URL
        #[arg(long, env = "CATALOG_STORE")]
        store: Option<String>,
        #[arg(long, env = "CATALOG_ADMIN_TOKEN", hide_env_values = true)]
        token: Option<String>,
        /// Pause between API calls
        #[arg(long, default_value_t = 500)]
        delay_ms: u64,
        #[arg(long, default_value_t = false)]
        dry_run: bool,
    },
}

#[derive(Args, Debug)]
struct RunCommand {
    #[arg(long)]
    input: PathBuf,
    #[arg(long)]
    output: Option<PathBuf>,
    /// Catalog rules file (.toml, .yaml or .yml)
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    authoritative: Option<PathBuf>,
    #[arg(long)]
    assets: Option<PathBuf>,
    #[arg(long)]
    base_url: Option<String>,
    #[arg(long)]
    image_report: Option<PathBuf>,
    /// JSON run report
    #[arg(long)]
    summary: Option<PathBuf>,
    /// Stages to run by name or number (read, repair, enrich, images, write)
    #[arg(long = "stage")]
    stages: Vec<String>,
    #[arg(long, default_value_t = false)]
    scan_all: bool,
    #[arg(long, default_value_t = false)]
    dry_run: bool,
    #[arg(short, long, default_value_t = false)]
    verbose: bool,
    /// Maximum number of issues to print
    #[arg(long, default_value_t = 20)]
    issue_limit: usize,
}

fn init_tracing() {
    let _ = fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .try_init();
}

fn dispatch(command: Commands) -> Result<()> {
    match command {
        Commands::Run(cmd) => handle_run(&RunArgs {
            input: cmd.input,
            output: cmd.output,
            config: cmd.config,
            authoritative: cmd.authoritative,
            assets: cmd.assets,
            base_url: cmd.base_url,
            image_report: cmd.image_report,
            summary: cmd.summary,
            stages: cmd.stages,
            scan_all: cmd.scan_all,
            dry_run: cmd.dry_run,
            verbose: cmd.verbose,
            issue_limit: cmd.issue_limit,
        })?,
        Commands::Inspect {
            input,
            config,
            scan_all,
            json,
        } => handle_inspect(&InspectArgs {
            input,
            config,
            scan_all,
            json,
        })?,
        Commands::Images {
            input,
            config,
            authoritative,
            assets,
            base_url,
            report,
        } => handle_images(&ImagesArgs {
            input,
            config,
            authoritative,
            assets,
            base_url,
            report,
        })?,
        Commands::Collections {
            input,
            store,
            token,
            delay_ms,
            dry_run,
        } => handle_collections(&CollectionsArgs {
            input,
            store,
            token,
            delay_ms,
            dry_run,
        })?,
    }
    Ok(())
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match dispatch(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let message = match err.downcast_ref::<CliError>() {
                Some(cli_err) => cli_err.user_message(),
                None => format!("{:#}", err),
            };
            eprintln!("Error: {}", message);
            ExitCode::from(1)
        }
    }
}
