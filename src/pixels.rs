//! Alpha-thresholded pixel maps built from source images.

use image::{GenericImageView, RgbaImage};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

use crate::color::Color;

/// Pixels with alpha below this are treated as empty space.
pub const DEFAULT_ALPHA_THRESHOLD: u8 = 200;

/// Error type for reading source images
#[derive(Debug, Error)]
pub enum PixelError {
    /// The image path does not point at a file
    #[error("image '{0}' does not exist")]
    NotFound(String),
    /// The image could not be opened or decoded
    #[error("failed to open image: {0}")]
    Image(#[from] image::ImageError),
}

/// A grid coordinate in base-pixel units.
///
/// Ordering is column-major (`x` first, then `y`), which is the order the
/// image is scanned in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Coord {
    pub x: u32,
    pub y: u32,
}

impl Coord {
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Offset by `(dx, dy)`.
    pub const fn offset(self, dx: u32, dy: u32) -> Self {
        Self { x: self.x + dx, y: self.y + dy }
    }
}

/// Sparse mapping from coordinate to color for every retained pixel.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PixelMap {
    width: u32,
    height: u32,
    pixels: BTreeMap<Coord, Color>,
}

impl PixelMap {
    /// Build a map from an in-memory image, keeping pixels whose alpha is at
    /// least `alpha_threshold`.
    pub fn from_image(image: &RgbaImage, alpha_threshold: u8) -> Self {
        let (width, height) = image.dimensions();
        let mut pixels = BTreeMap::new();

        for x in 0..width {
            for y in 0..height {
                let rgba = *image.get_pixel(x, y);
                if rgba[3] >= alpha_threshold {
                    pixels.insert(Coord::new(x, y), Color::from_rgba(rgba));
                }
            }
        }

        Self { width, height, pixels }
    }

    /// Open an image file and build its pixel map.
    pub fn open<P: AsRef<Path>>(path: P, alpha_threshold: u8) -> Result<Self, PixelError> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(PixelError::NotFound(path.display().to_string()));
        }

        let img = image::open(path)?;
        let (width, height) = img.dimensions();
        tracing::debug!(width, height, path = %path.display(), "scanning image");

        Ok(Self::from_image(&img.to_rgba8(), alpha_threshold))
    }

    /// Width of the source image in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height of the source image in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Number of pixels in the source image, retained or not.
    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Number of retained pixels.
    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    pub fn get(&self, coord: Coord) -> Option<Color> {
        self.pixels.get(&coord).copied()
    }

    /// Retained pixels in scan order.
    pub fn iter(&self) -> impl Iterator<Item = (Coord, Color)> + '_ {
        self.pixels.iter().map(|(c, col)| (*c, *col))
    }

    /// Consume the map, yielding the raw coordinate map.
    pub fn into_inner(self) -> BTreeMap<Coord, Color> {
        self.pixels
    }
}
