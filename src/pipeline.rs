//! End-to-end conversion: image -> blocks -> level objects -> patched save.

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::config::{GdConfig, ImageConfig};
use crate::level::{LevelEncoder, LevelError, LevelObjects};
use crate::merge::{merge_blocks, BlockLayers};
use crate::pixels::{PixelError, PixelMap};
use crate::save::{
    default_save_path, splice_level, CodecError, Fragments, FragmentsError, LevelMeta, SaveCodec,
    SpliceError,
};

/// Any failure along the import pipeline
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Pixel(#[from] PixelError),
    #[error(transparent)]
    Level(#[from] LevelError),
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error(transparent)]
    Splice(#[from] SpliceError),
    #[error(transparent)]
    Fragments(#[from] FragmentsError),
    #[error("Cannot access save file '{}': {source}", .path.display())]
    Save {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Could not determine the save file location, pass --save or set save.path")]
    NoSavePath,
}

/// The blocks and encoded objects for one image.
#[derive(Debug, Clone)]
pub struct Conversion {
    pub layers: BlockLayers,
    pub objects: LevelObjects,
}

/// Merge an image's pixels and encode the resulting blocks.
pub fn convert(pixels: PixelMap, config: &GdConfig) -> Result<Conversion, PipelineError> {
    let tiles = config.level.tile_table()?;
    let height = pixels.height();

    let layers = merge_blocks(pixels.into_inner(), tiles.max_scale(), config.merge.strategy);
    tracing::info!(blocks = layers.len(), strategy = %config.merge.strategy, "image merged");

    let objects = LevelEncoder::new(&tiles, config.level.layout, height).encode(&layers)?;
    Ok(Conversion { layers, objects })
}

/// Messages to show before processing an image of `area` pixels.
pub fn image_notices(area: u64, config: &ImageConfig) -> Vec<String> {
    let mut notices = Vec::new();
    if area > config.large_image_warning {
        notices.push(
            "Heads up - this tool is made for pixel art. Large images are not the best idea..."
                .to_string(),
        );
    }
    if area > config.slow_scan_notice {
        notices.push(format!("{} pixels, this may take a very long time", area));
    }
    notices
}

/// Decode a save container, insert a level and re-encode if requested.
pub fn patch_save(
    raw: &[u8],
    objects: &LevelObjects,
    fragments: &Fragments,
    meta: &LevelMeta,
    codec: &SaveCodec,
    encode_output: bool,
) -> Result<Vec<u8>, PipelineError> {
    let document = codec.decode(raw)?;
    let patched = splice_level(&document, fragments, &objects.data, meta)?;

    if encode_output {
        Ok(codec.encode(&patched)?)
    } else {
        Ok(patched.into_bytes())
    }
}

/// Save file to patch: configured path, else the platform default.
pub fn resolve_save_path(config: &GdConfig) -> Result<PathBuf, PipelineError> {
    config.save.path.clone().or_else(default_save_path).ok_or(PipelineError::NoSavePath)
}

/// Outcome of [`import_image`].
#[derive(Debug, Clone)]
pub struct ImportReport {
    pub save_path: PathBuf,
    pub layers: BlockLayers,
    pub object_count: usize,
    /// False for dry runs
    pub written: bool,
}

/// Run the whole pipeline for one image.
///
/// The save file is written only after the full document has been assembled;
/// any error leaves it untouched.
pub fn import_image(
    image: &Path,
    pixels: PixelMap,
    config: &GdConfig,
    dry_run: bool,
) -> Result<ImportReport, PipelineError> {
    let save_path = resolve_save_path(config)?;
    let fragments = Fragments::load_or_builtin(config.save.fragments.as_deref())?;

    let Conversion { layers, objects } = convert(pixels, config)?;

    let file_name = image
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let meta = LevelMeta::for_image(&file_name, objects.count);

    let raw = fs::read(&save_path)
        .map_err(|source| PipelineError::Save { path: save_path.clone(), source })?;
    let codec = SaveCodec::new(config.save.xor_key);
    let patched =
        patch_save(&raw, &objects, &fragments, &meta, &codec, config.save.encode_output)?;

    if !dry_run {
        fs::write(&save_path, patched)
            .map_err(|source| PipelineError::Save { path: save_path.clone(), source })?;
        tracing::info!(path = %save_path.display(), objects = objects.count, "save written");
    }

    Ok(ImportReport { save_path, layers, object_count: objects.count, written: !dry_run })
}
