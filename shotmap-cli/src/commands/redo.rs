//! Redo command implementation - re-synthesize selected tiles

use anyhow::{anyhow, Context, Result};
use std::path::PathBuf;

use crate::config::Config;
use crate::FormatArg;
use shotmap_core::{PyramidBuilder, RunReport, ScreenshotCatalog, TileCoord, TileWriter};

#[allow(clippy::too_many_arguments)]
pub fn execute(
    config: &Config,
    shots: PathBuf,
    out: PathBuf,
    tiles: Vec<String>,
    from_report: bool,
    format: Option<FormatArg>,
    tile_size: Option<u32>,
    tolerance: Option<u8>,
) -> Result<()> {
    if tiles.is_empty() && !from_report {
        return Err(anyhow!(
            "Nothing to rebuild; pass tiles as 'zoom:col:row' or use --from-report"
        ));
    }

    if !shots.is_dir() {
        return Err(anyhow!(
            "Screenshot directory does not exist: {}",
            shots.display()
        ));
    }

    let mut coords = Vec::new();
    for spec in &tiles {
        coords.push(parse_tile_spec(spec)?);
    }
    // An existing report contributes its failures when asked; either way its
    // untouched records are carried into the report this run saves.
    let prior = if from_report {
        let report = RunReport::load(&out).with_context(|| {
            format!(
                "Failed to read {} in {}",
                RunReport::FILENAME,
                out.display()
            )
        })?;
        coords.extend(report.failed_tiles());
        Some(report)
    } else {
        RunReport::load(&out).ok()
    };
    coords.sort_by_key(|coord| (coord.zoom, coord.row, coord.col));
    coords.dedup();

    if coords.is_empty() {
        log::info!("No failed tiles recorded; nothing to rebuild");
        return Ok(());
    }
    log::info!("Rebuilding {} tiles", coords.len());

    let zooms = config.zoom_table();
    let tile_px = tile_size.unwrap_or(config.tiles.size);
    if tile_px == 0 {
        return Err(anyhow!("Tile size must be at least 1 pixel"));
    }
    let tolerance = tolerance.unwrap_or(config.tiles.tolerance);
    let format = format.map_or(config.tiles.format, FormatArg::into_format);

    let catalog = ScreenshotCatalog::scan(&shots, &config.level_specs(), &config.layers)
        .context("Failed to scan screenshot directory")?;

    let writer = TileWriter::new(&out, format);
    let builder = PyramidBuilder::new(
        &catalog,
        &zooms,
        &config.layers,
        &writer,
        tile_px,
        tolerance,
    );

    let mut report = builder.rebuild(&coords)?;
    if let Some(prior) = &prior {
        report.carry_failures(prior, &coords);
    }
    // Replace the saved report, keeping prior failures this run did not
    // retry, so a later --from-report converges on what still fails.
    let report_path = report.save(&out).context("Failed to write run report")?;

    log::info!(
        "Rebuilt {} tiles, {} still failing",
        report.tiles_written(),
        report.failures(),
    );
    log::info!("Report written to: {}", report_path.display());

    Ok(())
}

/// Parse one tile position given as `zoom:col:row`.
fn parse_tile_spec(spec: &str) -> Result<TileCoord> {
    let parts: Vec<&str> = spec.split(':').collect();
    if parts.len() != 3 {
        return Err(anyhow!(
            "Invalid tile: {}. Expected 'zoom:col:row'",
            spec
        ));
    }

    let zoom = parts[0]
        .trim()
        .parse()
        .with_context(|| format!("Invalid zoom in tile: {}", spec))?;
    let col = parts[1]
        .trim()
        .parse()
        .with_context(|| format!("Invalid column in tile: {}", spec))?;
    let row = parts[2]
        .trim()
        .parse()
        .with_context(|| format!("Invalid row in tile: {}", spec))?;

    Ok(TileCoord { zoom, col, row })
}
