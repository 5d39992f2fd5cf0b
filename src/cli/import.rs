//! Import command implementation

use std::path::Path;
use std::process::ExitCode;

use super::{effective_config, EXIT_ERROR, EXIT_INVALID_ARGS, EXIT_SUCCESS};
use crate::config::CliOverrides;
use crate::pipeline::{image_notices, import_image};
use crate::pixels::PixelMap;

/// Execute the import command
pub fn run_import(
    input: &Path,
    config_path: Option<&Path>,
    overrides: &CliOverrides,
    dry_run: bool,
) -> ExitCode {
    if !input.is_file() {
        eprintln!("Error: Invalid file location '{}'! Make sure the file exists.", input.display());
        return ExitCode::from(EXIT_INVALID_ARGS);
    }

    let config = match effective_config(config_path, overrides) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let pixels = match PixelMap::open(input, config.image.alpha_threshold) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    for notice in image_notices(pixels.area(), &config.image) {
        println!("{}", notice);
    }
    println!("Converting {} ({} pixels kept)...", input.display(), pixels.len());

    let report = match import_image(input, pixels, &config, dry_run) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    for (scale, count) in report.layers.counts() {
        println!("  x{}: {} blocks", scale, count);
    }

    if report.written {
        println!("Saved to {} ({} objects)", report.save_path.display(), report.object_count);
    } else {
        println!(
            "Dry run: {} not modified ({} objects)",
            report.save_path.display(),
            report.object_count
        );
    }

    ExitCode::from(EXIT_SUCCESS)
}
