//! Decode command implementation

use std::path::Path;
use std::process::ExitCode;

use super::{effective_config, EXIT_ERROR, EXIT_INVALID_ARGS, EXIT_SUCCESS};
use crate::config::CliOverrides;
use crate::save::SaveCodec;

/// Execute the decode command
pub fn run_decode(input: &Path, output: Option<&Path>, config_path: Option<&Path>) -> ExitCode {
    let config = match effective_config(config_path, &CliOverrides::default()) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let raw = match std::fs::read(input) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error: Cannot open save file '{}': {}", input.display(), e);
            return ExitCode::from(EXIT_INVALID_ARGS);
        }
    };

    let document = match SaveCodec::new(config.save.xor_key).decode(&raw) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    match output {
        Some(path) => {
            if let Err(e) = std::fs::write(path, &document) {
                eprintln!("Error: Failed to write '{}': {}", path.display(), e);
                return ExitCode::from(EXIT_ERROR);
            }
            println!("Decoded: {} ({} bytes)", path.display(), document.len());
        }
        None => println!("{}", document),
    }

    ExitCode::from(EXIT_SUCCESS)
}
