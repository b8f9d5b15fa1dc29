use crate::types::{GridShape, ImageSize};

/// Default output tile edge length in pixels, per slippy-map convention.
pub const DEFAULT_TILE_SIZE: u32 = 256;

/// Row-major linear index of a grid cell. No bounds checking; the caller
/// guarantees the cell lies inside the grid.
pub fn tile_index(col: u32, row: u32, n_cols: u32) -> usize {
    row as usize * n_cols as usize + col as usize
}

/// Grid cell containing a canvas pixel position.
///
/// Positions past the physical edge clamp to the nearest edge cell, so
/// rectangles overhanging the world boundary degrade to duplicated edge
/// pixels instead of failing.
pub fn native_cell_of(x: i64, y: i64, image_size: ImageSize, grid: GridShape) -> (u32, u32) {
    let col = x
        .div_euclid(image_size.width as i64)
        .clamp(0, grid.cols as i64 - 1);
    let row = y
        .div_euclid(image_size.height as i64)
        .clamp(0, grid.rows as i64 - 1);
    (col as u32, row as u32)
}

/// Linear index of the screenshot containing a canvas pixel position.
pub fn native_index_of(x: i64, y: i64, image_size: ImageSize, grid: GridShape) -> usize {
    let (col, row) = native_cell_of(x, y, image_size, grid);
    tile_index(col, row, grid.cols)
}

/// Output tile grid dimensions (columns, rows) for one display level: the
/// full canvas extent divided by the native footprint of one output tile,
/// rounded up so partial edge tiles are still produced.
pub fn pyramid_shape(grid: GridShape, image_size: ImageSize, native_tile_px: u32) -> (u32, u32) {
    let canvas_w = grid.cols as u64 * image_size.width as u64;
    let canvas_h = grid.rows as u64 * image_size.height as u64;
    let n_cols = canvas_w.div_ceil(native_tile_px as u64) as u32;
    let n_rows = canvas_h.div_ceil(native_tile_px as u64) as u32;
    (n_cols, n_rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIZE: ImageSize = ImageSize {
        width: 3840,
        height: 2160,
    };
    const GRID: GridShape = GridShape { rows: 2, cols: 2 };

    #[test]
    fn test_cell_lookup_inside_canvas() {
        assert_eq!(native_cell_of(0, 0, SIZE, GRID), (0, 0));
        assert_eq!(native_cell_of(3839, 2159, SIZE, GRID), (0, 0));
        assert_eq!(native_cell_of(3840, 0, SIZE, GRID), (1, 0));
        assert_eq!(native_cell_of(0, 2160, SIZE, GRID), (0, 1));
        assert_eq!(native_cell_of(7679, 4319, SIZE, GRID), (1, 1));
    }

    #[test]
    fn test_cell_lookup_clamps_past_edges() {
        assert_eq!(native_cell_of(-500, -1, SIZE, GRID), (0, 0));
        assert_eq!(native_cell_of(7680, 0, SIZE, GRID), (1, 0));
        assert_eq!(native_cell_of(99_999, 99_999, SIZE, GRID), (1, 1));
    }

    #[test]
    fn test_linear_index_row_major() {
        assert_eq!(tile_index(0, 0, 13), 0);
        assert_eq!(tile_index(12, 0, 13), 12);
        assert_eq!(tile_index(0, 1, 13), 13);
        assert_eq!(tile_index(3, 2, 13), 29);
        assert_eq!(native_index_of(3840, 2160, SIZE, GRID), 3);
    }

    #[test]
    fn test_pyramid_shape_rounds_up() {
        assert_eq!(pyramid_shape(GRID, SIZE, 512), (15, 9));
        let exact = pyramid_shape(
            GridShape { rows: 1, cols: 1 },
            ImageSize {
                width: 1024,
                height: 512,
            },
            256,
        );
        assert_eq!(exact, (4, 2));
    }
}
