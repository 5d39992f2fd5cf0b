//! pixelgd - Library for turning pixel art into Geometry Dash levels
//!
//! This library provides functionality to:
//! - Read images into alpha-thresholded pixel maps
//! - Merge same-colored pixels into the fewest power-of-two square blocks
//! - Encode blocks as level objects with HSV color tags
//! - Decode, patch and re-encode the editor's local levels save file

pub mod cli;
pub mod color;
pub mod config;
pub mod level;
pub mod merge;
pub mod pipeline;
pub mod pixels;
pub mod save;
