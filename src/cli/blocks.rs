//! Blocks command implementation

use std::path::Path;
use std::process::ExitCode;

use super::{effective_config, EXIT_ERROR, EXIT_INVALID_ARGS, EXIT_SUCCESS};
use crate::config::CliOverrides;
use crate::pipeline::convert;
use crate::pixels::PixelMap;

/// Execute the blocks command
pub fn run_blocks(input: &Path, config_path: Option<&Path>, overrides: &CliOverrides) -> ExitCode {
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
    let (width, height, kept) = (pixels.width(), pixels.height(), pixels.len());

    let conversion = match convert(pixels, &config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    println!(
        "{} ({}x{}, {} pixels kept, {} merge)",
        input.display(),
        width,
        height,
        kept,
        config.merge.strategy
    );
    for (scale, count) in conversion.layers.counts() {
        println!("  x{}: {} blocks", scale, count);
    }
    println!("Total: {} objects", conversion.objects.count);

    ExitCode::from(EXIT_SUCCESS)
}
