//! Tile output encoding and directory layout.
//!
//! Tiles land in the slippy-map arrangement viewers expect:
//! `{layer}/{zoom}/{col}/{row}.{ext}` under a single output root.

use std::fs;
use std::path::{Path, PathBuf};

use image::codecs::png::PngEncoder;
use image::codecs::webp::WebPEncoder;
use image::{ExtendedColorType, ImageEncoder, RgbaImage};
use serde::{Deserialize, Serialize};

use crate::error::{TileError, TileResult};
use crate::types::TileCoord;

/// On-disk encoding for emitted tiles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TileFormat {
    /// Lossless WebP, the compact default.
    #[default]
    Webp,
    /// PNG for toolchains without WebP support.
    Png,
}

impl TileFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            TileFormat::Webp => "webp",
            TileFormat::Png => "png",
        }
    }
}

/// Writes finished tiles beneath an output root.
#[derive(Debug, Clone)]
pub struct TileWriter {
    root: PathBuf,
    format: TileFormat,
}

impl TileWriter {
    pub fn new<P: AsRef<Path>>(root: P, format: TileFormat) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            format,
        }
    }

    pub fn format(&self) -> TileFormat {
        self.format
    }

    /// Path a tile of `layer` at `coord` is stored under.
    pub fn tile_path(&self, layer: &str, coord: TileCoord) -> PathBuf {
        self.root
            .join(layer)
            .join(coord.zoom.to_string())
            .join(coord.col.to_string())
            .join(format!("{}.{}", coord.row, self.format.extension()))
    }

    /// Encode `image` and write it to the tile's path, creating parent
    /// directories as needed. The file is only created once encoding has
    /// succeeded, so a failed encode never leaves a truncated tile behind.
    pub fn write(&self, layer: &str, coord: TileCoord, image: &RgbaImage) -> TileResult<PathBuf> {
        let path = self.tile_path(layer, coord);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let (width, height) = image.dimensions();
        let mut bytes = Vec::new();
        let encoded = match self.format {
            TileFormat::Webp => WebPEncoder::new_lossless(&mut bytes).write_image(
                image.as_raw(),
                width,
                height,
                ExtendedColorType::Rgba8,
            ),
            TileFormat::Png => PngEncoder::new(&mut bytes).write_image(
                image.as_raw(),
                width,
                height,
                ExtendedColorType::Rgba8,
            ),
        };
        encoded.map_err(|source| TileError::Encode {
            path: path.clone(),
            source,
        })?;

        fs::write(&path, bytes)?;
        Ok(path)
    }
}
