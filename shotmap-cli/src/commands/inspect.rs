//! Inspect command implementation - screenshot coverage and pyramid overview

use anyhow::{anyhow, Context, Result};
use std::path::PathBuf;

use crate::config::Config;
use shotmap_core::coords::pyramid_shape;
use shotmap_core::{Layer, ScreenshotCatalog};

pub fn execute(config: &Config, shots: PathBuf, missing: bool) -> Result<()> {
    if !shots.is_dir() {
        return Err(anyhow!(
            "Screenshot directory does not exist: {}",
            shots.display()
        ));
    }

    let catalog = ScreenshotCatalog::scan(&shots, &config.level_specs(), &config.layers)
        .context("Failed to scan screenshot directory")?;

    println!("Screenshots in {}:", shots.display());
    for level in catalog.levels() {
        let spec = level.spec();
        println!(
            "  Native level {} ({} x {} grid of {} x {} px):",
            spec.zoom,
            spec.grid.cols,
            spec.grid.rows,
            spec.image_size.width,
            spec.image_size.height,
        );
        for layer in Layer::ALL {
            let count = level.count(layer);
            println!(
                "    {:<8} {:>4} of {}",
                config.layers.token(layer),
                count,
                spec.grid.cell_count(),
            );
            // A layer with no screenshots at all is absent, not gappy.
            if missing && count > 0 {
                let gaps = level.missing_indices(layer);
                if !gaps.is_empty() {
                    println!("             missing {}", format_indices(&gaps));
                }
            }
        }
    }

    println!();
    println!("Pyramid at {} px per tile:", config.tiles.size);
    let zooms = config.zoom_table();
    for display in zooms.display_levels() {
        let entry = zooms.resolve(display)?;
        match catalog.level(entry.native) {
            Ok(level) => {
                let spec = level.spec();
                let (cols, rows) = pyramid_shape(
                    spec.grid,
                    spec.image_size,
                    entry.native_tile_px(config.tiles.size),
                );
                println!(
                    "  Zoom {}: native level {} at scale {} -> {} x {} tiles",
                    display, entry.native, entry.scale, cols, rows,
                );
            }
            Err(_) => {
                println!(
                    "  Zoom {}: native level {} is not configured",
                    display, entry.native,
                );
            }
        }
    }

    Ok(())
}

fn format_indices(indices: &[usize]) -> String {
    const SHOWN: usize = 16;
    let shown: Vec<String> = indices.iter().take(SHOWN).map(usize::to_string).collect();
    if indices.len() > SHOWN {
        format!("{} and {} more", shown.join(", "), indices.len() - SHOWN)
    } else {
        shown.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_indices_short_list() {
        assert_eq!(format_indices(&[2, 5, 9]), "2, 5, 9");
    }

    #[test]
    fn test_format_indices_caps_long_list() {
        let indices: Vec<usize> = (0..20).collect();
        let text = format_indices(&indices);
        assert!(text.ends_with("and 4 more"));
        assert!(text.starts_with("0, 1, 2"));
    }
}
