//! Region stitching across the screenshot grid.
//!
//! A tile's source footprint is never guaranteed to align with the native
//! grid, so any requested rectangle may straddle up to four adjacent
//! screenshots. The stitcher composites the base screenshot with its right,
//! lower, and diagonal neighbors as the rectangle's corners demand.

use image::RgbaImage;

use crate::catalog::ScreenshotSource;
use crate::coords::native_index_of;
use crate::error::TileResult;
use crate::raster;
use crate::types::{Layer, PixelRect};

/// Composite the canvas rectangle `rect` from up to four adjacent
/// screenshots of `layer`. The result always has `rect`'s dimensions;
/// canvas areas with no screenshot read as fully transparent.
pub fn stitch<S: ScreenshotSource>(
    source: &S,
    layer: Layer,
    rect: PixelRect,
) -> TileResult<RgbaImage> {
    let image_size = source.image_size();
    let grid = source.grid();
    let (img_w, img_h) = (image_size.width as i64, image_size.height as i64);

    let top_left = native_index_of(rect.x, rect.y, image_size, grid);
    let top_right = native_index_of(rect.right(), rect.y, image_size, grid);
    let bottom_left = native_index_of(rect.x, rect.bottom(), image_size, grid);
    let bottom_right = native_index_of(rect.right(), rect.bottom(), image_size, grid);

    // Reduce the origin into the top-left screenshot's local space. Negative
    // origins are border padding and stay as they are.
    let local_x = if rect.x > 0 { rect.x % img_w } else { rect.x };
    let local_y = if rect.y > 0 { rect.y % img_h } else { rect.y };

    let mut region = match source.load(layer, top_left)? {
        Some(img) => raster::crop_from_canvas(&img, local_x, local_y, rect.width, rect.height),
        None => raster::blank(rect.width, rect.height),
    };

    if top_right > top_left {
        // Crosses a column boundary: bring in the right neighbor, shifted
        // left by one screenshot width.
        if let Some(img) = source.load(layer, top_right)? {
            let patch =
                raster::crop_from_canvas(&img, local_x - img_w, local_y, rect.width, rect.height);
            raster::composite_over(&mut region, &patch);
        }
    }
    if bottom_left > top_left {
        // Crosses a row boundary: bring in the neighbor below.
        if let Some(img) = source.load(layer, bottom_left)? {
            let patch =
                raster::crop_from_canvas(&img, local_x, local_y - img_h, rect.width, rect.height);
            raster::composite_over(&mut region, &patch);
        }
    }
    if bottom_right > top_right && bottom_right > bottom_left {
        // Crosses both: the diagonal neighbor fills the far corner.
        if let Some(img) = source.load(layer, bottom_right)? {
            let patch = raster::crop_from_canvas(
                &img,
                local_x - img_w,
                local_y - img_h,
                rect.width,
                rect.height,
            );
            raster::composite_over(&mut region, &patch);
        }
    }

    Ok(region)
}
