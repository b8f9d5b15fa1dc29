//! Pixel-level primitives shared by the stitcher and the compositor.

use image::{imageops, RgbaImage};

use crate::error::{TileError, TileResult};

/// Default channel tolerance for the identity and blankness tests.
///
/// Absorbs compression and rounding noise between independently captured
/// screenshots; an exact equality test would spuriously emit near-duplicate
/// tiles.
pub const DEFAULT_TOLERANCE: u8 = 3;

/// Fully transparent image of the given size.
pub fn blank(width: u32, height: u32) -> RgbaImage {
    RgbaImage::new(width, height)
}

/// Crop a rectangle from an image as if it were embedded in an infinite
/// transparent canvas. The origin may be negative and the rectangle may
/// overhang any edge; uncovered areas stay transparent.
pub fn crop_from_canvas(src: &RgbaImage, x: i64, y: i64, width: u32, height: u32) -> RgbaImage {
    let mut out = RgbaImage::new(width, height);
    imageops::replace(&mut out, src, -x, -y);
    out
}

/// Copy out the `width` x `height` subregion anchored at (x, y).
pub fn crop(src: &RgbaImage, x: u32, y: u32, width: u32, height: u32) -> RgbaImage {
    imageops::crop_imm(src, x, y, width, height).to_image()
}

/// Alpha-composite `top` over `base` in place.
pub fn composite_over(base: &mut RgbaImage, top: &RgbaImage) {
    imageops::overlay(base, top, 0, 0);
}

/// Tolerance-based identity test.
///
/// Two images match when every channel of every pixel, alpha included,
/// differs by at most `tolerance`. Symmetric in its arguments.
pub fn images_match(a: &RgbaImage, b: &RgbaImage, tolerance: u8) -> TileResult<bool> {
    if a.dimensions() != b.dimensions() {
        return Err(TileError::SizeMismatch(
            a.width(),
            a.height(),
            b.width(),
            b.height(),
        ));
    }
    Ok(a.as_raw()
        .iter()
        .zip(b.as_raw().iter())
        .all(|(&pa, &pb)| pa.abs_diff(pb) <= tolerance))
}

/// True when the image compares identical to a fully transparent one,
/// without allocating the reference.
pub fn is_blank(img: &RgbaImage, tolerance: u8) -> bool {
    img.as_raw().iter().all(|&v| v <= tolerance)
}
