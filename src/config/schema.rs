//! Configuration schema types for `pxgd.toml`
//!
//! Every section is optional; missing values fall back to the defaults the
//! editor's save format expects.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::level::{LevelError, LevelLayout, TileTable};
use crate::merge::MergeStrategy;
use crate::pixels::DEFAULT_ALPHA_THRESHOLD;
use crate::save::DEFAULT_XOR_KEY;

/// Source image settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageConfig {
    /// Minimum alpha for a pixel to become an object
    #[serde(default = "default_alpha_threshold")]
    pub alpha_threshold: u8,
    /// Pixel count above which the image is considered too large for pixel art
    #[serde(default = "default_large_image_warning")]
    pub large_image_warning: u64,
    /// Pixel count above which scanning is announced as slow
    #[serde(default = "default_slow_scan_notice")]
    pub slow_scan_notice: u64,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            alpha_threshold: default_alpha_threshold(),
            large_image_warning: default_large_image_warning(),
            slow_scan_notice: default_slow_scan_notice(),
        }
    }
}

fn default_alpha_threshold() -> u8 {
    DEFAULT_ALPHA_THRESHOLD
}

fn default_large_image_warning() -> u64 {
    100_000
}

fn default_slow_scan_notice() -> u64 {
    10_000
}

/// Block merging settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MergeConfig {
    /// Group search strategy
    #[serde(default)]
    pub strategy: MergeStrategy,
}

/// Level object placement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelConfig {
    /// Grid to level coordinate mapping
    #[serde(flatten)]
    pub layout: LevelLayout,
    /// Block scale (as a string key) to tile identifier
    #[serde(default = "default_tiles")]
    pub tiles: BTreeMap<String, String>,
}

impl Default for LevelConfig {
    fn default() -> Self {
        Self { layout: LevelLayout::default(), tiles: default_tiles() }
    }
}

impl LevelConfig {
    pub fn tile_table(&self) -> Result<TileTable, LevelError> {
        TileTable::from_string_keys(&self.tiles)
    }
}

fn default_tiles() -> BTreeMap<String, String> {
    TileTable::default().entries().map(|(s, t)| (s.to_string(), t.to_string())).collect()
}

/// Save file settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveConfig {
    /// Save file to patch (platform default when unset)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    /// Re-apply the container encoding before writing
    #[serde(default)]
    pub encode_output: bool,
    /// XOR key of the container encoding
    #[serde(default = "default_xor_key")]
    pub xor_key: u8,
    /// JSON file with the level template fragments (built-in when unset)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fragments: Option<PathBuf>,
}

impl Default for SaveConfig {
    fn default() -> Self {
        Self { path: None, encode_output: false, xor_key: default_xor_key(), fragments: None }
    }
}

fn default_xor_key() -> u8 {
    DEFAULT_XOR_KEY
}

/// Complete `pxgd.toml` configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GdConfig {
    #[serde(default)]
    pub image: ImageConfig,
    #[serde(default)]
    pub merge: MergeConfig,
    #[serde(default)]
    pub level: LevelConfig,
    #[serde(default)]
    pub save: SaveConfig,
}

/// A config validation error
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigValidationError {
    /// Path to the invalid field (e.g., "level.tiles")
    pub field: String,
    /// Error message
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "pxgd.toml: '{}' {}", self.field, self.message)
    }
}

impl GdConfig {
    /// Validate the configuration and return any errors
    pub fn validate(&self) -> Vec<ConfigValidationError> {
        let mut errors = Vec::new();

        if let Err(e) = self.level.tile_table() {
            errors.push(ConfigValidationError {
                field: "level.tiles".to_string(),
                message: e.to_string(),
            });
        }

        if self.level.layout.cell_size <= 0.0 {
            errors.push(ConfigValidationError {
                field: "level.cell_size".to_string(),
                message: "must be positive".to_string(),
            });
        }

        if self.image.alpha_threshold == 0 {
            errors.push(ConfigValidationError {
                field: "image.alpha_threshold".to_string(),
                message: "must be at least 1, or fully transparent pixels become objects"
                    .to_string(),
            });
        }

        errors
    }

    /// Check if validation passed
    pub fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }
}
