//! Pyramid orchestration.
//!
//! Fans tile synthesis out over the rayon thread pool one display level at
//! a time and folds per-tile outcomes into a run report. Tiles are
//! independent, so a failed tile is recorded and the rest of the level
//! keeps going.

use std::collections::{BTreeMap, HashSet};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::catalog::{LayerNames, LevelCatalog, ScreenshotCatalog};
use crate::compose::{synthesize_tile, SynthesisParams};
use crate::coords::pyramid_shape;
use crate::error::TileResult;
use crate::types::{DisplayZoom, Layer, NativeZoom, TileCoord};
use crate::writer::TileWriter;
use crate::zoom::ZoomTable;

/// Result of synthesizing one tile position.
#[derive(Debug, Clone)]
pub struct TileOutcome {
    pub coord: TileCoord,
    /// Layers actually written, in evaluation order.
    pub emitted: Vec<Layer>,
    pub error: Option<String>,
}

/// A tile that could not be synthesized or written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedTile {
    pub zoom: DisplayZoom,
    pub col: u32,
    pub row: u32,
    pub error: String,
}

impl FailedTile {
    pub fn coord(&self) -> TileCoord {
        TileCoord {
            zoom: self.zoom,
            col: self.col,
            row: self.row,
        }
    }
}

/// Synthesis statistics for one display level.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelReport {
    pub zoom: DisplayZoom,
    pub tile_cols: u32,
    pub tile_rows: u32,
    /// Tile positions processed.
    pub synthesized: usize,
    pub surface_tiles: usize,
    pub hollow_tiles: usize,
    pub cave_tiles: usize,
    /// Positions where no layer had content.
    pub skipped: usize,
    pub failed: Vec<FailedTile>,
}

impl LevelReport {
    pub fn tiles_written(&self) -> usize {
        self.surface_tiles + self.hollow_tiles + self.cave_tiles
    }
}

/// Summary of a whole pyramid run, written next to the tiles as JSON so a
/// follow-up `redo` can retry exactly the tiles that failed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub generated: DateTime<Utc>,
    pub tile_px: u32,
    pub levels: Vec<LevelReport>,
}

impl RunReport {
    pub const FILENAME: &'static str = "tiling-report.json";

    pub fn new(tile_px: u32) -> Self {
        Self {
            generated: Utc::now(),
            tile_px,
            levels: Vec::new(),
        }
    }

    pub fn tiles_written(&self) -> usize {
        self.levels.iter().map(LevelReport::tiles_written).sum()
    }

    pub fn failures(&self) -> usize {
        self.levels.iter().map(|level| level.failed.len()).sum()
    }

    /// Coordinates of every failed tile across all levels.
    pub fn failed_tiles(&self) -> Vec<TileCoord> {
        self.levels
            .iter()
            .flat_map(|level| level.failed.iter().map(FailedTile::coord))
            .collect()
    }

    /// Merge in the failure records of an earlier report for every tile
    /// this run did not retry. A partial retry then never forgets a
    /// known-bad tile: repeated retries work the recorded set down to
    /// whatever still fails.
    pub fn carry_failures(&mut self, prior: &RunReport, retried: &[TileCoord]) {
        let retried: HashSet<TileCoord> = retried.iter().copied().collect();
        for prior_level in &prior.levels {
            let carried: Vec<FailedTile> = prior_level
                .failed
                .iter()
                .filter(|failure| !retried.contains(&failure.coord()))
                .cloned()
                .collect();
            if carried.is_empty() {
                continue;
            }
            match self
                .levels
                .iter_mut()
                .find(|level| level.zoom == prior_level.zoom)
            {
                Some(level) => level.failed.extend(carried),
                None => self.levels.push(LevelReport {
                    zoom: prior_level.zoom,
                    tile_cols: prior_level.tile_cols,
                    tile_rows: prior_level.tile_rows,
                    synthesized: 0,
                    surface_tiles: 0,
                    hollow_tiles: 0,
                    cave_tiles: 0,
                    skipped: 0,
                    failed: carried,
                }),
            }
        }
        self.levels.sort_by_key(|level| level.zoom);
    }

    /// Write the report as `tiling-report.json` inside `dir`.
    pub fn save(&self, dir: &Path) -> TileResult<PathBuf> {
        let path = dir.join(Self::FILENAME);
        let file = File::create(&path)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.flush()?;
        Ok(path)
    }

    /// Read a previously saved report from `dir`.
    pub fn load(dir: &Path) -> TileResult<Self> {
        let file = File::open(dir.join(Self::FILENAME))?;
        let reader = BufReader::new(file);
        Ok(serde_json::from_reader(reader)?)
    }
}

/// Drives tile synthesis for every display level of a capture set.
pub struct PyramidBuilder<'a> {
    catalog: &'a ScreenshotCatalog,
    zooms: &'a ZoomTable,
    names: &'a LayerNames,
    writer: &'a TileWriter,
    tile_px: u32,
    tolerance: u8,
}

struct LevelContext<'a> {
    level: &'a LevelCatalog,
    native: NativeZoom,
    params: SynthesisParams,
    tile_cols: u32,
    tile_rows: u32,
}

impl<'a> PyramidBuilder<'a> {
    pub fn new(
        catalog: &'a ScreenshotCatalog,
        zooms: &'a ZoomTable,
        names: &'a LayerNames,
        writer: &'a TileWriter,
        tile_px: u32,
        tolerance: u8,
    ) -> Self {
        Self {
            catalog,
            zooms,
            names,
            writer,
            tile_px,
            tolerance,
        }
    }

    fn context(&self, display: DisplayZoom) -> TileResult<LevelContext<'a>> {
        let entry = self.zooms.resolve(display)?;
        let level = self.catalog.level(entry.native)?;
        let spec = level.spec();
        let params = SynthesisParams {
            tile_px: self.tile_px,
            scale: entry.scale,
            tolerance: self.tolerance,
        };
        let (tile_cols, tile_rows) =
            pyramid_shape(spec.grid, spec.image_size, params.native_tile_px());
        Ok(LevelContext {
            level,
            native: entry.native,
            params,
            tile_cols,
            tile_rows,
        })
    }

    /// Synthesize every tile position of one display level.
    pub fn build_level(&self, display: DisplayZoom) -> TileResult<LevelReport> {
        let ctx = self.context(display)?;
        log::info!(
            "Building zoom {} from native level {}: {} x {} tiles",
            display,
            ctx.native,
            ctx.tile_cols,
            ctx.tile_rows,
        );

        let coords: Vec<TileCoord> = (0..ctx.tile_rows)
            .flat_map(|row| {
                (0..ctx.tile_cols).map(move |col| TileCoord {
                    zoom: display,
                    col,
                    row,
                })
            })
            .collect();

        let outcomes: Vec<TileOutcome> = coords
            .into_par_iter()
            .map(|coord| self.run_tile(ctx.level, &ctx.params, coord))
            .collect();

        let report = summarize(display, ctx.tile_cols, ctx.tile_rows, &outcomes);
        log::info!(
            "Zoom {}: {} tiles written, {} empty, {} failed",
            display,
            report.tiles_written(),
            report.skipped,
            report.failed.len(),
        );
        Ok(report)
    }

    /// Build the listed display levels in order.
    pub fn build_levels(&self, displays: &[DisplayZoom]) -> TileResult<RunReport> {
        let mut report = RunReport::new(self.tile_px);
        for &display in displays {
            report.levels.push(self.build_level(display)?);
        }
        Ok(report)
    }

    /// Build every display level the zoom table defines.
    pub fn build_all(&self) -> TileResult<RunReport> {
        let displays: Vec<DisplayZoom> = self.zooms.display_levels().collect();
        self.build_levels(&displays)
    }

    /// Re-synthesize an explicit set of tile positions, for example the
    /// failures of an earlier run.
    pub fn rebuild(&self, tiles: &[TileCoord]) -> TileResult<RunReport> {
        let mut by_zoom: BTreeMap<DisplayZoom, Vec<TileCoord>> = BTreeMap::new();
        for &coord in tiles {
            by_zoom.entry(coord.zoom).or_default().push(coord);
        }

        let mut report = RunReport::new(self.tile_px);
        for (display, coords) in by_zoom {
            let ctx = self.context(display)?;
            log::info!("Rebuilding {} tiles at zoom {}", coords.len(), display);

            let outcomes: Vec<TileOutcome> = coords
                .into_par_iter()
                .map(|coord| self.run_tile(ctx.level, &ctx.params, coord))
                .collect();

            report
                .levels
                .push(summarize(display, ctx.tile_cols, ctx.tile_rows, &outcomes));
        }
        Ok(report)
    }

    fn run_tile(
        &self,
        level: &LevelCatalog,
        params: &SynthesisParams,
        coord: TileCoord,
    ) -> TileOutcome {
        match self.synthesize_and_write(level, params, coord) {
            Ok(emitted) => TileOutcome {
                coord,
                emitted,
                error: None,
            },
            Err(err) => {
                log::error!(
                    "Tile ({}, {}) at zoom {} failed: {}",
                    coord.col,
                    coord.row,
                    coord.zoom,
                    err,
                );
                TileOutcome {
                    coord,
                    emitted: Vec::new(),
                    error: Some(err.to_string()),
                }
            }
        }
    }

    fn synthesize_and_write(
        &self,
        level: &LevelCatalog,
        params: &SynthesisParams,
        coord: TileCoord,
    ) -> TileResult<Vec<Layer>> {
        let layers = synthesize_tile(level, params, coord)?;
        let mut written = Vec::with_capacity(layers.len());
        for (layer, image) in &layers {
            let token = self.names.token(*layer);
            self.writer.write(token, coord, image)?;
            log::debug!(
                "Saved '{}' tile ({}, {}) at zoom {}",
                token,
                coord.col,
                coord.row,
                coord.zoom,
            );
            written.push(*layer);
        }
        Ok(written)
    }
}

fn summarize(
    display: DisplayZoom,
    tile_cols: u32,
    tile_rows: u32,
    outcomes: &[TileOutcome],
) -> LevelReport {
    let mut report = LevelReport {
        zoom: display,
        tile_cols,
        tile_rows,
        synthesized: outcomes.len(),
        surface_tiles: 0,
        hollow_tiles: 0,
        cave_tiles: 0,
        skipped: 0,
        failed: Vec::new(),
    };
    for outcome in outcomes {
        if let Some(error) = &outcome.error {
            report.failed.push(FailedTile {
                zoom: outcome.coord.zoom,
                col: outcome.coord.col,
                row: outcome.coord.row,
                error: error.clone(),
            });
            continue;
        }
        if outcome.emitted.is_empty() {
            report.skipped += 1;
        }
        for layer in &outcome.emitted {
            match layer {
                Layer::Surface => report.surface_tiles += 1,
                Layer::Hollow => report.hollow_tiles += 1,
                Layer::Cave => report.cave_tiles += 1,
            }
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn outcome(col: u32, row: u32, emitted: Vec<Layer>, error: Option<&str>) -> TileOutcome {
        TileOutcome {
            coord: TileCoord { zoom: 2, col, row },
            emitted,
            error: error.map(str::to_string),
        }
    }

    #[test]
    fn test_summarize_counts_layers_and_failures() {
        let outcomes = vec![
            outcome(0, 0, vec![Layer::Hollow, Layer::Surface], None),
            outcome(1, 0, vec![Layer::Surface], None),
            outcome(0, 1, vec![], None),
            outcome(1, 1, vec![], Some("boom")),
        ];
        let report = summarize(2, 2, 2, &outcomes);

        assert_eq!(report.synthesized, 4);
        assert_eq!(report.surface_tiles, 2);
        assert_eq!(report.hollow_tiles, 1);
        assert_eq!(report.cave_tiles, 0);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.tiles_written(), 3);
        assert_eq!(
            report.failed,
            vec![FailedTile {
                zoom: 2,
                col: 1,
                row: 1,
                error: "boom".to_string(),
            }]
        );
    }

    #[test]
    fn test_report_roundtrips_through_json() {
        let dir = TempDir::new().unwrap();
        let mut report = RunReport::new(256);
        report.levels.push(summarize(
            0,
            3,
            2,
            &[
                outcome(0, 0, vec![Layer::Surface], None),
                outcome(2, 1, vec![], Some("decode failed")),
            ],
        ));

        let path = report.save(dir.path()).unwrap();
        assert_eq!(path, dir.path().join(RunReport::FILENAME));

        let restored = RunReport::load(dir.path()).unwrap();
        assert_eq!(restored.tile_px, 256);
        assert_eq!(restored.tiles_written(), 1);
        assert_eq!(restored.failures(), 1);
        assert_eq!(
            restored.failed_tiles(),
            vec![TileCoord {
                zoom: 0,
                col: 2,
                row: 1,
            }]
        );
    }

    #[test]
    fn test_missing_report_is_an_error() {
        let dir = TempDir::new().unwrap();
        assert!(RunReport::load(dir.path()).is_err());
    }

    fn level_with_failures(
        zoom: DisplayZoom,
        (tile_cols, tile_rows): (u32, u32),
        failed: &[(u32, u32)],
    ) -> LevelReport {
        LevelReport {
            zoom,
            tile_cols,
            tile_rows,
            synthesized: failed.len(),
            surface_tiles: 0,
            hollow_tiles: 0,
            cave_tiles: 0,
            skipped: 0,
            failed: failed
                .iter()
                .map(|&(col, row)| FailedTile {
                    zoom,
                    col,
                    row,
                    error: "decode failed".to_string(),
                })
                .collect(),
        }
    }

    #[test]
    fn test_carry_failures_keeps_untouched_records() {
        let mut prior = RunReport::new(256);
        prior
            .levels
            .push(level_with_failures(1, (3, 3), &[(0, 0), (2, 1)]));
        prior.levels.push(level_with_failures(2, (5, 5), &[(4, 4)]));

        // Retry only (0, 0) at zoom 1; it succeeds this time.
        let retried = vec![TileCoord {
            zoom: 1,
            col: 0,
            row: 0,
        }];
        let mut report = RunReport::new(256);
        report.levels.push(summarize(
            1,
            3,
            3,
            &[TileOutcome {
                coord: retried[0],
                emitted: vec![Layer::Surface],
                error: None,
            }],
        ));

        report.carry_failures(&prior, &retried);

        assert_eq!(report.failures(), 2);
        let still_failing = report.failed_tiles();
        assert!(still_failing.contains(&TileCoord {
            zoom: 1,
            col: 2,
            row: 1,
        }));
        assert!(still_failing.contains(&TileCoord {
            zoom: 2,
            col: 4,
            row: 4,
        }));

        // Zoom 2 was not rebuilt; its record keeps the prior dimensions and
        // counts nothing as synthesized.
        let level2 = report.levels.iter().find(|l| l.zoom == 2).unwrap();
        assert_eq!((level2.tile_cols, level2.tile_rows), (5, 5));
        assert_eq!(level2.synthesized, 0);
        assert_eq!(report.tiles_written(), 1);
    }

    #[test]
    fn test_carry_failures_drops_nothing_without_retries() {
        let mut prior = RunReport::new(256);
        prior
            .levels
            .push(level_with_failures(0, (2, 2), &[(1, 1)]));

        let mut report = RunReport::new(256);
        report.carry_failures(&prior, &[]);

        assert_eq!(report.failures(), 1);
        assert_eq!(
            report.failed_tiles(),
            vec![TileCoord {
                zoom: 0,
                col: 1,
                row: 1,
            }]
        );
    }
}
