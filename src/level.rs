//! Level object encoding
//!
//! Each block becomes one object in the editor's level string:
//!
//! ```text
//! 1,<tile>,2,<x>,3,<y>,21,10,41,1,43,<h>a<s>a<v>a0a0;
//! ```
//!
//! Key `1` is the object id, `2`/`3` the position, `21` the color channel,
//! `41` enables the HSV override and `43` carries the HSV string.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::merge::{Block, BlockLayers};

/// Error type for level encoding
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LevelError {
    /// No tile is configured for a block scale
    #[error("no tile configured for block scale {0}")]
    MissingTile(u32),
    /// A tile table key is not a power of two
    #[error("tile scale {0} is not a power of two")]
    InvalidScale(u32),
    /// A tile table key could not be parsed
    #[error("tile scale '{0}' is not a number")]
    UnparsableScale(String),
    /// The tile table lacks the base scale
    #[error("tile table must contain an entry for scale 1")]
    MissingBaseTile,
}

/// Lookup from block scale to tile identifier.
///
/// Identifiers are spliced into the record verbatim. Larger scales reuse the
/// 30-unit base block with extra `key,value` fields appended, e.g.
/// `211,32,2` is tile 211 with its scale field (32) set to 2.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileTable {
    tiles: BTreeMap<u32, String>,
}

impl Default for TileTable {
    fn default() -> Self {
        let tiles = [(1, "917"), (2, "916"), (4, "211"), (8, "211,32,2"), (16, "211,32,4")]
            .into_iter()
            .map(|(s, t)| (s, t.to_string()))
            .collect();
        Self { tiles }
    }
}

impl TileTable {
    /// Build a table from `(scale, tile)` pairs.
    pub fn from_entries<I>(entries: I) -> Result<Self, LevelError>
    where
        I: IntoIterator<Item = (u32, String)>,
    {
        let mut tiles = BTreeMap::new();
        for (scale, tile) in entries {
            if !scale.is_power_of_two() {
                return Err(LevelError::InvalidScale(scale));
            }
            tiles.insert(scale, tile);
        }
        if !tiles.contains_key(&1) {
            return Err(LevelError::MissingBaseTile);
        }
        Ok(Self { tiles })
    }

    /// Build a table from string-keyed entries as found in TOML tables.
    pub fn from_string_keys(entries: &BTreeMap<String, String>) -> Result<Self, LevelError> {
        let mut parsed = Vec::with_capacity(entries.len());
        for (key, tile) in entries {
            let scale =
                key.trim().parse::<u32>().map_err(|_| LevelError::UnparsableScale(key.clone()))?;
            parsed.push((scale, tile.clone()));
        }
        Self::from_entries(parsed)
    }

    pub fn get(&self, scale: u32) -> Option<&str> {
        self.tiles.get(&scale).map(String::as_str)
    }

    /// `(scale, tile)` pairs, smallest scale first.
    pub fn entries(&self) -> impl Iterator<Item = (u32, &str)> + '_ {
        self.tiles.iter().map(|(&s, t)| (s, t.as_str()))
    }

    /// Largest block side that has a tile.
    ///
    /// The merge must stop here; each scale in between also needs an entry.
    pub fn max_scale(&self) -> u32 {
        let mut scale = 1;
        while self.tiles.contains_key(&(scale * 2)) {
            scale *= 2;
        }
        scale
    }
}

/// Mapping from image grid to level coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelLayout {
    /// Level x of the image's left edge
    pub origin_x: f64,
    /// Level y offset below the image's top edge
    pub origin_y: f64,
    /// Size of one editor grid cell in level units
    pub cell_size: f64,
    /// Level units per image row used to lift the image above the ground
    pub height_factor: f64,
}

impl Default for LevelLayout {
    fn default() -> Self {
        Self { origin_x: 300.0, origin_y: 200.0, cell_size: 30.0, height_factor: 8.0 }
    }
}

impl LevelLayout {
    /// Center of a block in level coordinates.
    ///
    /// One pixel is a quarter cell; a block's center sits half its side
    /// (an eighth of a cell per pixel of scale) from its anchor. The y axis
    /// points up, so rows go downward from the image's top.
    pub fn position(&self, block: &Block, image_height: u32) -> (f64, f64) {
        let pixel = self.cell_size / 4.0;
        let half = self.cell_size / 8.0;
        let scale = block.scale as f64;

        let x = self.origin_x + block.anchor.x as f64 * pixel + scale * half;
        let top = self.origin_y + image_height as f64 * self.height_factor;
        let y = top - block.anchor.y as f64 * pixel - scale * half;
        (x, y)
    }
}

/// Encoded level objects plus how many there are.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LevelObjects {
    pub data: String,
    pub count: usize,
}

/// Turns blocks into level object records.
#[derive(Debug, Clone)]
pub struct LevelEncoder<'a> {
    tiles: &'a TileTable,
    layout: LevelLayout,
    image_height: u32,
}

impl<'a> LevelEncoder<'a> {
    pub fn new(tiles: &'a TileTable, layout: LevelLayout, image_height: u32) -> Self {
        Self { tiles, layout, image_height }
    }

    /// Encode a single block, terminator included.
    ///
    /// Coordinates use Rust's shortest float form, so whole positions print
    /// as `330` rather than `330.0`. The editor parses either.
    pub fn encode_block(&self, block: &Block) -> Result<String, LevelError> {
        let tile = self.tiles.get(block.scale).ok_or(LevelError::MissingTile(block.scale))?;
        let (x, y) = self.layout.position(block, self.image_height);
        let hsv = block.color.to_hsv();
        Ok(format!("1,{},2,{},3,{},21,10,41,1,43,{};", tile, x, y, hsv.to_tag()))
    }

    /// Encode every block, smallest scale first.
    pub fn encode(&self, layers: &BlockLayers) -> Result<LevelObjects, LevelError> {
        let mut objects = LevelObjects::default();
        for block in layers.blocks() {
            objects.data.push_str(&self.encode_block(&block)?);
            objects.count += 1;
        }
        Ok(objects)
    }
}
