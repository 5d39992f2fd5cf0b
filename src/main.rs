//! pixelgd - Command-line tool for importing pixel art into Geometry Dash levels

use std::process::ExitCode;

use pixelgd::cli;

fn main() -> ExitCode {
    cli::run()
}
