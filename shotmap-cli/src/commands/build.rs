//! Build command implementation - synthesize the tile pyramid from screenshots

use anyhow::{anyhow, Context, Result};
use std::path::PathBuf;

use crate::config::Config;
use crate::FormatArg;
use shotmap_core::zoom::ZoomTable;
use shotmap_core::{DisplayZoom, PyramidBuilder, ScreenshotCatalog, TileWriter};

pub fn execute(
    config: &Config,
    shots: PathBuf,
    out: PathBuf,
    zoom: Option<String>,
    format: Option<FormatArg>,
    tile_size: Option<u32>,
    tolerance: Option<u8>,
) -> Result<()> {
    log::info!("Building tile pyramid");
    log::info!("Screenshot directory: {}", shots.display());
    log::info!("Output directory: {}", out.display());

    if !shots.is_dir() {
        return Err(anyhow!(
            "Screenshot directory does not exist: {}",
            shots.display()
        ));
    }

    let zooms = config.zoom_table();
    let displays: Vec<DisplayZoom> = match zoom {
        Some(spec) => parse_zoom_spec(&spec, &zooms)?,
        None => zooms.display_levels().collect(),
    };

    let tile_px = tile_size.unwrap_or(config.tiles.size);
    if tile_px == 0 {
        return Err(anyhow!("Tile size must be at least 1 pixel"));
    }
    let tolerance = tolerance.unwrap_or(config.tiles.tolerance);
    let format = format.map_or(config.tiles.format, FormatArg::into_format);

    log::info!(
        "Synthesizing {} display levels as {} px {:?} tiles",
        displays.len(),
        tile_px,
        format,
    );

    let catalog = ScreenshotCatalog::scan(&shots, &config.level_specs(), &config.layers)
        .context("Failed to scan screenshot directory")?;

    std::fs::create_dir_all(&out)
        .with_context(|| format!("Failed to create output directory: {}", out.display()))?;

    let writer = TileWriter::new(&out, format);
    let builder = PyramidBuilder::new(
        &catalog,
        &zooms,
        &config.layers,
        &writer,
        tile_px,
        tolerance,
    );

    let report = builder.build_levels(&displays)?;
    let report_path = report.save(&out).context("Failed to write run report")?;

    log::info!(
        "Wrote {} tiles across {} levels",
        report.tiles_written(),
        report.levels.len(),
    );
    log::info!("Report written to: {}", report_path.display());
    if report.failures() > 0 {
        log::warn!(
            "{} tiles failed; run 'shotmap redo --from-report' to retry them",
            report.failures(),
        );
    }

    Ok(())
}

/// Parse a display level selection like `3`, `2,5`, or `0..4` (inclusive).
/// Comma-separated parts may mix single levels and ranges.
fn parse_zoom_spec(spec: &str, zooms: &ZoomTable) -> Result<Vec<DisplayZoom>> {
    let mut levels = Vec::new();

    for part in spec.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }

        if let Some((start, end)) = part.split_once("..") {
            let start: DisplayZoom = start
                .trim()
                .parse()
                .with_context(|| format!("Invalid zoom range: {}", part))?;
            let end: DisplayZoom = end
                .trim()
                .parse()
                .with_context(|| format!("Invalid zoom range: {}", part))?;
            if start > end {
                return Err(anyhow!(
                    "Zoom range start ({}) must not exceed end ({})",
                    start,
                    end
                ));
            }
            levels.extend(start..=end);
        } else {
            let level = part
                .parse()
                .with_context(|| format!("Invalid zoom level: {}", part))?;
            levels.push(level);
        }
    }

    if levels.is_empty() {
        return Err(anyhow!("No zoom levels found in specification: {}", spec));
    }

    levels.sort_unstable();
    levels.dedup();

    for &level in &levels {
        zooms
            .resolve(level)
            .with_context(|| format!("Unknown display level in --zoom: {}", level))?;
    }

    Ok(levels)
}
