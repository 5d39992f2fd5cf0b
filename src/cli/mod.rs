//! Command-line interface implementation
//!
//! This module provides the CLI entry point and dispatches to submodules
//! for specific command implementations.

mod blocks;
mod decode;
mod import;

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use crate::config::{load_config, merge_cli_overrides, CliOverrides, GdConfig};
use crate::merge::MergeStrategy;

/// Exit codes
pub(crate) const EXIT_SUCCESS: u8 = 0;
pub(crate) const EXIT_ERROR: u8 = 1;
pub(crate) const EXIT_INVALID_ARGS: u8 = 2;

/// Environment variable holding the log filter
const LOG_ENV: &str = "PXGD_LOG";

/// pixelgd - Turn pixel art into Geometry Dash levels
#[derive(Parser)]
#[command(name = "pxgd")]
#[command(about = "pixelgd - Turn pixel art into Geometry Dash levels in your local save")]
#[command(version)]
pub struct Cli {
    /// Show debug logs on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Convert an image and insert it as a new level in the save file
    Import {
        /// Image to convert (PNG or any format with an alpha channel)
        input: PathBuf,

        /// Save file to patch (default: the editor's CCLocalLevels.dat)
        #[arg(short, long)]
        save: Option<PathBuf>,

        /// JSON file with the `ham`, `bur` and `ger` level fragments
        #[arg(short, long)]
        fragments: Option<PathBuf>,

        /// Config file (default: nearest pxgd.toml)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// How to find mergeable 2x2 groups
        #[arg(long, value_enum)]
        strategy: Option<MergeStrategy>,

        /// Minimum alpha (1-255) for a pixel to become an object
        #[arg(long, value_parser = clap::value_parser!(u8).range(1..=255))]
        alpha_threshold: Option<u8>,

        /// Re-encode the save file instead of writing plaintext
        #[arg(long)]
        encode: bool,

        /// Do everything except writing the save file
        #[arg(long)]
        dry_run: bool,
    },
    /// Decode a save file to its plaintext document
    Decode {
        /// Save file to decode
        input: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Config file (default: nearest pxgd.toml)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Show how an image would be split into blocks
    Blocks {
        /// Image to analyze
        input: PathBuf,

        /// Config file (default: nearest pxgd.toml)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// How to find mergeable 2x2 groups
        #[arg(long, value_enum)]
        strategy: Option<MergeStrategy>,

        /// Minimum alpha (1-255) for a pixel to become an object
        #[arg(long, value_parser = clap::value_parser!(u8).range(1..=255))]
        alpha_threshold: Option<u8>,
    },
}

/// Install the stderr log subscriber.
fn init_logging(verbose: bool) {
    let default = if verbose { "pixelgd=debug" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default));

    // A subscriber may already be installed when running inside tests
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .try_init();
}

/// Load the config file and apply command-line overrides.
pub(crate) fn effective_config(
    config_path: Option<&Path>,
    overrides: &CliOverrides,
) -> Result<GdConfig, ExitCode> {
    let mut config = match load_config(config_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            return Err(ExitCode::from(EXIT_ERROR));
        }
    };
    merge_cli_overrides(&mut config, overrides);
    Ok(config)
}

/// Run the CLI application
pub fn run() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Import {
            input,
            save,
            fragments,
            config,
            strategy,
            alpha_threshold,
            encode,
            dry_run,
        } => {
            let overrides = CliOverrides {
                save,
                fragments,
                strategy,
                alpha_threshold,
                encode_output: encode.then_some(true),
            };
            import::run_import(&input, config.as_deref(), &overrides, dry_run)
        }
        Commands::Decode { input, output, config } => {
            decode::run_decode(&input, output.as_deref(), config.as_deref())
        }
        Commands::Blocks { input, config, strategy, alpha_threshold } => {
            let overrides = CliOverrides { strategy, alpha_threshold, ..Default::default() };
            blocks::run_blocks(&input, config.as_deref(), &overrides)
        }
    }
}
