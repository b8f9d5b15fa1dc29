use image::{Rgba, RgbaImage};
use shotmap_core::catalog::{LayerNames, LevelSpec};
use shotmap_core::{
    GridShape, ImageSize, PyramidBuilder, RunReport, ScreenshotCatalog, TileFormat, TileWriter,
    ZoomEntry, ZoomTable,
};
use std::path::Path;
use tempfile::TempDir;

const IMG: ImageSize = ImageSize {
    width: 24,
    height: 24,
};
const GRID: GridShape = GridShape { rows: 2, cols: 2 };
const TILE: u32 = 16;

const RED: [u8; 4] = [255, 0, 0, 255];
const GREEN: [u8; 4] = [0, 255, 0, 255];
const BLUE: [u8; 4] = [0, 0, 255, 255];
const YELLOW: [u8; 4] = [255, 255, 0, 255];

fn level_specs() -> Vec<LevelSpec> {
    vec![LevelSpec {
        zoom: 0,
        grid: GRID,
        image_size: IMG,
    }]
}

fn zoom_table() -> ZoomTable {
    ZoomTable::from_entries([
        (
            0,
            ZoomEntry {
                native: 0,
                scale: 0.5,
            },
        ),
        (
            1,
            ZoomEntry {
                native: 0,
                scale: 1.0,
            },
        ),
    ])
}

fn write_solid(dir: &Path, index: usize, layer: &str, color: [u8; 4]) {
    let img = RgbaImage::from_pixel(IMG.width, IMG.height, Rgba(color));
    img.save(dir.join(format!("{}-{}-0.png", index, layer)))
        .expect("write screenshot");
}

/// Transparent hollow screenshot with an opaque marker in its top-left
/// corner, inside the footprint of display-level-1 tile (0, 0).
fn write_marker_hollow(dir: &Path, index: usize) {
    let mut img = RgbaImage::new(IMG.width, IMG.height);
    for y in 2..8 {
        for x in 2..8 {
            img.put_pixel(x, y, Rgba(GREEN));
        }
    }
    img.save(dir.join(format!("{}-hollow-0.png", index)))
        .expect("write screenshot");
}

/// Four solid surface screenshots plus one hollow marker.
fn seed_screenshots(dir: &Path) {
    for (index, color) in [RED, GREEN, BLUE, YELLOW].into_iter().enumerate() {
        write_solid(dir, index, "surface", color);
    }
    write_marker_hollow(dir, 0);
}

#[test]
fn pyramid_build_two_levels() {
    let shots = TempDir::new().expect("shots dir");
    let out = TempDir::new().expect("out dir");
    seed_screenshots(shots.path());

    let names = LayerNames::default();
    let catalog = ScreenshotCatalog::scan(shots.path(), &level_specs(), &names).expect("scan");
    let zooms = zoom_table();
    let writer = TileWriter::new(out.path(), TileFormat::Webp);
    let builder = PyramidBuilder::new(&catalog, &zooms, &names, &writer, TILE, 3);

    let report = builder.build_all().expect("build");
    report.save(out.path()).expect("save report");

    // Display 0: canvas 48x48 at half scale, 32 native px per tile.
    let level0 = &report.levels[0];
    assert_eq!((level0.tile_cols, level0.tile_rows), (2, 2));
    assert_eq!(level0.synthesized, 4);
    assert_eq!(level0.surface_tiles, 4);
    assert_eq!(level0.hollow_tiles, 1);
    assert_eq!(level0.cave_tiles, 0);
    assert_eq!(level0.skipped, 0);
    assert!(level0.failed.is_empty());

    // Display 1: full resolution, 16 native px per tile.
    let level1 = &report.levels[1];
    assert_eq!((level1.tile_cols, level1.tile_rows), (3, 3));
    assert_eq!(level1.surface_tiles, 9);
    assert_eq!(level1.hollow_tiles, 1);
    assert_eq!(level1.cave_tiles, 0);

    // No cave screenshots, so the cave directory is never created.
    assert!(!out.path().join("cave").exists());
    assert!(out.path().join("surface/1/2/2.webp").is_file());
    assert!(out.path().join("hollow/1/0/0.webp").is_file());
    assert!(!out.path().join("hollow/1/1/1.webp").exists());

    // Tile (1, 1) at full resolution straddles both screenshot seams; each
    // quadrant comes from a different source file and survives losslessly.
    let tile = image::open(out.path().join("surface/1/1/1.webp"))
        .expect("open tile")
        .into_rgba8();
    assert_eq!(tile.dimensions(), (TILE, TILE));
    assert_eq!(tile.get_pixel(3, 3).0, RED);
    assert_eq!(tile.get_pixel(12, 3).0, GREEN);
    assert_eq!(tile.get_pixel(3, 12).0, BLUE);
    assert_eq!(tile.get_pixel(12, 12).0, YELLOW);
    // Seam columns are exact, with no bleed from the neighbor.
    assert_eq!(tile.get_pixel(7, 3).0, RED);
    assert_eq!(tile.get_pixel(8, 3).0, GREEN);
    assert_eq!(tile.get_pixel(3, 7).0, RED);
    assert_eq!(tile.get_pixel(3, 8).0, BLUE);

    // The hollow tile is pre-composited: marker where the hollow layer has
    // content, surface everywhere else.
    let hollow = image::open(out.path().join("hollow/1/0/0.webp"))
        .expect("open hollow tile")
        .into_rgba8();
    assert_eq!(hollow.get_pixel(4, 4).0, GREEN);
    assert_eq!(hollow.get_pixel(12, 12).0, RED);

    // The saved report reads back with the same totals.
    let restored = RunReport::load(out.path()).expect("load report");
    assert_eq!(restored.tile_px, TILE);
    assert_eq!(restored.tiles_written(), report.tiles_written());
    assert_eq!(restored.failures(), 0);
}

#[test]
fn corrupt_screenshot_reported_then_rebuilt() {
    let shots = TempDir::new().expect("shots dir");
    let out = TempDir::new().expect("out dir");
    seed_screenshots(shots.path());
    // Overwrite one surface screenshot with bytes that do not decode.
    std::fs::write(shots.path().join("3-surface-0.png"), b"not a png").expect("corrupt");

    let names = LayerNames::default();
    let catalog = ScreenshotCatalog::scan(shots.path(), &level_specs(), &names).expect("scan");
    let zooms = zoom_table();
    let writer = TileWriter::new(out.path(), TileFormat::Webp);
    let builder = PyramidBuilder::new(&catalog, &zooms, &names, &writer, TILE, 3);

    // Every full-resolution tile reads a margin wide enough to touch the
    // broken screenshot, so the whole level fails tile by tile.
    let report = builder.build_levels(&[1]).expect("build");
    assert_eq!(report.levels[0].failed.len(), 9);
    assert_eq!(report.tiles_written(), 0);
    report.save(out.path()).expect("save report");

    // Restore the screenshot and retry the first batch of recorded
    // failures.
    write_solid(shots.path(), 3, "surface", YELLOW);
    let catalog = ScreenshotCatalog::scan(shots.path(), &level_specs(), &names).expect("rescan");
    let builder = PyramidBuilder::new(&catalog, &zooms, &names, &writer, TILE, 3);

    let prior = RunReport::load(out.path()).expect("load report");
    let failed = prior.failed_tiles();
    assert_eq!(failed.len(), 9);
    let (first, rest) = failed.split_at(4);

    let mut retry = builder.rebuild(first).expect("rebuild");
    retry.carry_failures(&prior, first);
    // The four retried tiles recovered; the untouched five carry over.
    assert_eq!(retry.failures(), 5);
    assert_eq!(retry.failed_tiles(), rest.to_vec());
    // 4 surface tiles plus the hollow marker tile at (0, 0).
    assert_eq!(retry.tiles_written(), 5);
    retry.save(out.path()).expect("save report");

    // The carried report drives the next round down to zero.
    let prior = RunReport::load(out.path()).expect("reload report");
    let remaining = prior.failed_tiles();
    assert_eq!(remaining.len(), 5);
    let mut last = builder.rebuild(&remaining).expect("rebuild rest");
    last.carry_failures(&prior, &remaining);
    assert_eq!(last.failures(), 0);
    assert_eq!(last.tiles_written(), 5);
    assert!(out.path().join("surface/1/2/2.webp").is_file());
}
