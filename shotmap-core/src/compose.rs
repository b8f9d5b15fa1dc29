//! Per-tile layer composition and emission filtering.
//!
//! Every tile is synthesized from a region three native tiles on a side,
//! centered on the tile, so the resampler sees the same neighborhood
//! context for adjacent tiles and their shared borders come out identical.
//! Only the central tile-sized crop is ever emitted.

use image::RgbaImage;

use crate::catalog::ScreenshotSource;
use crate::error::TileResult;
use crate::raster;
use crate::resample::resize_gamma_aware;
use crate::stitch::stitch;
use crate::types::{Layer, PixelRect, TileCoord};

/// Tunables for one display level's synthesis.
#[derive(Debug, Clone, Copy)]
pub struct SynthesisParams {
    /// Output tile edge length in pixels.
    pub tile_px: u32,
    /// Output pixels per native pixel.
    pub scale: f64,
    /// Channel delta the content filters treat as identical.
    pub tolerance: u8,
}

impl SynthesisParams {
    /// Native-resolution edge length covered by one output tile.
    pub fn native_tile_px(&self) -> u32 {
        (self.tile_px as f64 / self.scale) as u32
    }
}

/// Stitch, filter, and resample one output tile.
///
/// Returns the emitted layers in evaluation order (hollow, surface, cave),
/// each exactly `tile_px` square. The hollow layer is emitted only when its
/// composite over the surface differs from the surface alone; surface and
/// cave are emitted only when their centers are not fully transparent.
pub fn synthesize_tile<S: ScreenshotSource>(
    source: &S,
    params: &SynthesisParams,
    coord: TileCoord,
) -> TileResult<Vec<(Layer, RgbaImage)>> {
    let native_tile = params.native_tile_px();
    let rect = PixelRect {
        x: (coord.col as i64 - 1) * native_tile as i64,
        y: (coord.row as i64 - 1) * native_tile as i64,
        width: native_tile * 3,
        height: native_tile * 3,
    };

    let surface = stitch(source, Layer::Surface, rect)?;
    let hollow = stitch(source, Layer::Hollow, rect)?;
    let cave = stitch(source, Layer::Cave, rect)?;

    // Hollow tiles are published pre-composited over the surface, so a
    // viewer switching layers swaps one image instead of stacking two.
    let mut hollow_composite = surface.clone();
    raster::composite_over(&mut hollow_composite, &hollow);

    let surface_center = center_crop(&surface, native_tile);
    let composite_center = center_crop(&hollow_composite, native_tile);
    let cave_center = center_crop(&cave, native_tile);

    let mut emitted = Vec::new();
    if !raster::images_match(&surface_center, &composite_center, params.tolerance)? {
        emitted.push((Layer::Hollow, finish_layer(hollow_composite, params, native_tile)));
    }
    if !raster::is_blank(&surface_center, params.tolerance) {
        emitted.push((Layer::Surface, finish_layer(surface, params, native_tile)));
    }
    if !raster::is_blank(&cave_center, params.tolerance) {
        emitted.push((Layer::Cave, finish_layer(cave, params, native_tile)));
    }

    Ok(emitted)
}

fn center_crop(region: &RgbaImage, tile: u32) -> RgbaImage {
    raster::crop(region, tile, tile, tile, tile)
}

/// Resample the full region to output resolution when the scale is not 1:1,
/// then cut the central tile.
fn finish_layer(region: RgbaImage, params: &SynthesisParams, native_tile: u32) -> RgbaImage {
    let region = if native_tile != params.tile_px {
        resize_gamma_aware(&region, params.tile_px * 3, params.tile_px * 3)
    } else {
        region
    };
    center_crop(&region, params.tile_px)
}
