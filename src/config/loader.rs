//! Configuration loading and discovery for `pxgd.toml`
//!
//! Provides functions to find, load, and merge configuration.

use super::schema::GdConfig;
use crate::merge::MergeStrategy;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the configuration file.
pub const CONFIG_FILE_NAME: &str = "pxgd.toml";

/// Configuration loading error
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// File I/O error
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error
    #[error("Failed to parse pxgd.toml: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error
    #[error("Config validation failed:\n{}", .0.iter().map(|e| format!("  - {}", e)).collect::<Vec<_>>().join("\n"))]
    Validation(Vec<String>),
}

/// CLI arguments that can override config values
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    /// Override save file path
    pub save: Option<PathBuf>,
    /// Override fragments file
    pub fragments: Option<PathBuf>,
    /// Override merge strategy
    pub strategy: Option<MergeStrategy>,
    /// Override alpha threshold
    pub alpha_threshold: Option<u8>,
    /// Force re-encoding of the written save
    pub encode_output: Option<bool>,
}

/// Find pxgd.toml by walking up from the current working directory.
///
/// Search order:
/// 1. Walk up from current directory looking for pxgd.toml
/// 2. Check XDG_CONFIG_HOME/pixelgd/pxgd.toml (or ~/.config/pixelgd/pxgd.toml)
pub fn find_config() -> Option<PathBuf> {
    if let Ok(cwd) = env::current_dir() {
        if let Some(path) = find_config_from(cwd) {
            return Some(path);
        }
    }

    find_xdg_config()
}

/// Find pxgd.toml in XDG config directory.
pub fn find_xdg_config() -> Option<PathBuf> {
    let xdg_config = env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|_| env::var("HOME").map(|h| PathBuf::from(h).join(".config")))
        .ok()?;

    let config_path = xdg_config.join("pixelgd").join(CONFIG_FILE_NAME);
    if config_path.exists() {
        Some(config_path)
    } else {
        None
    }
}

/// Find pxgd.toml by walking up from a specific directory.
pub fn find_config_from(start: PathBuf) -> Option<PathBuf> {
    let mut current = start;

    loop {
        let config_path = current.join(CONFIG_FILE_NAME);
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            return None;
        }
    }
}

/// Load configuration from a pxgd.toml file.
///
/// If a path is provided, loads from that file. Otherwise, uses `find_config()`
/// to locate the config file. If no config file is found, returns the default
/// configuration.
pub fn load_config(path: Option<&Path>) -> Result<GdConfig, ConfigError> {
    let config_path = match path {
        Some(p) => Some(p.to_path_buf()),
        None => find_config(),
    };

    match config_path {
        Some(p) => load_config_file(&p),
        None => Ok(GdConfig::default()),
    }
}

/// Load configuration from a specific file path.
fn load_config_file(path: &Path) -> Result<GdConfig, ConfigError> {
    tracing::debug!(path = %path.display(), "loading config");
    let contents = fs::read_to_string(path)?;
    let mut config: GdConfig = toml::from_str(&contents)?;

    let errors = config.validate();
    if !errors.is_empty() {
        return Err(ConfigError::Validation(errors.into_iter().map(|e| e.to_string()).collect()));
    }

    // Relative paths in the file are relative to the file itself
    if let Some(root) = path.parent() {
        config.save.path = config.save.path.map(|p| resolve_path(root, &p));
        config.save.fragments = config.save.fragments.map(|p| resolve_path(root, &p));
    }

    Ok(config)
}

/// Merge CLI overrides into a configuration.
///
/// CLI arguments take precedence over config file values.
pub fn merge_cli_overrides(config: &mut GdConfig, overrides: &CliOverrides) {
    if let Some(ref save) = overrides.save {
        config.save.path = Some(save.clone());
    }

    if let Some(ref fragments) = overrides.fragments {
        config.save.fragments = Some(fragments.clone());
    }

    if let Some(strategy) = overrides.strategy {
        config.merge.strategy = strategy;
    }

    if let Some(alpha_threshold) = overrides.alpha_threshold {
        config.image.alpha_threshold = alpha_threshold;
    }

    if let Some(encode_output) = overrides.encode_output {
        config.save.encode_output = encode_output;
    }
}

/// Resolve a path relative to a base directory.
///
/// If the path is absolute, returns it unchanged.
pub fn resolve_path(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}
