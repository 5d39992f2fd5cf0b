//! Color types and RGB to HSV conversion
//!
//! Level objects are tinted through an HSV adjustment string, so every block
//! color has to be expressed as hue (degrees), saturation and value.

use image::Rgba;
use std::fmt;

/// An opaque RGB color as retained from the source image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Drop the alpha channel of an image pixel.
    pub fn from_rgba(rgba: Rgba<u8>) -> Self {
        let [r, g, b, _] = rgba.0;
        Self { r, g, b }
    }

    /// Hex notation, e.g. `#FF8000`.
    pub fn to_hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }

    pub fn to_hsv(self) -> Hsv {
        rgb_to_hsv(self)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// A color in HSV space.
///
/// `hue` is whole degrees in `0..360`; `saturation` and `value` are in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hsv {
    pub hue: u16,
    pub saturation: f64,
    pub value: f64,
}

impl Hsv {
    /// Format as the level editor's HSV adjustment string.
    ///
    /// The three components are joined with `a`, followed by the two
    /// "additive" toggles of the format, both off. Floats use Rust's
    /// shortest form (`1`, not `1.0`); the editor reads both.
    ///
    /// ```
    /// use pixelgd::color::{Color, rgb_to_hsv};
    ///
    /// let tag = rgb_to_hsv(Color::new(255, 0, 0)).to_tag();
    /// assert_eq!(tag, "0a1a1a0a0");
    /// ```
    pub fn to_tag(&self) -> String {
        format!("{}a{}a{}a0a0", self.hue, self.saturation, self.value)
    }
}

/// Convert an RGB color to HSV.
///
/// # Edge cases
///
/// - Achromatic colors (all channels equal) have hue 0.
/// - Black has saturation 0.
/// - Hue rounds half to even, so 232.5 becomes 232.
/// - A hue that rounds to 360 wraps around to 0.
pub fn rgb_to_hsv(color: Color) -> Hsv {
    let r = color.r as f64 / 255.0;
    let g = color.g as f64 / 255.0;
    let b = color.b as f64 / 255.0;

    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let hue = if delta == 0.0 {
        0.0
    } else if max == r {
        (60.0 * ((g - b) / delta) + 360.0) % 360.0
    } else if max == g {
        (60.0 * ((b - r) / delta) + 120.0) % 360.0
    } else {
        (60.0 * ((r - g) / delta) + 240.0) % 360.0
    };

    let saturation = if max == 0.0 { 0.0 } else { delta / max };

    Hsv {
        hue: (hue.round_ties_even() as u16) % 360,
        saturation,
        value: max,
    }
}
