//! Configuration handling for the shotmap CLI
//!
//! Supports loading configuration from shotmap.toml files with CLI argument overrides.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use shotmap_core::catalog::{LayerNames, LevelSpec};
use shotmap_core::coords::DEFAULT_TILE_SIZE;
use shotmap_core::raster::DEFAULT_TOLERANCE;
use shotmap_core::writer::TileFormat;
use shotmap_core::zoom::{ZoomEntry, ZoomTable};
use shotmap_core::{GridShape, ImageSize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub tiles: TilesConfig,

    #[serde(default)]
    pub layers: LayerNames,

    /// Capture geometry of each native zoom level
    #[serde(default = "default_levels")]
    pub levels: Vec<LevelSection>,

    /// Display-to-native zoom mapping
    #[serde(default = "default_zooms")]
    pub zooms: Vec<ZoomSection>,

    #[serde(default)]
    pub run: RunConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TilesConfig {
    /// Output tile edge length in pixels
    #[serde(default = "default_tile_size")]
    pub size: u32,

    /// Tile encoding (webp or png)
    #[serde(default)]
    pub format: TileFormat,

    /// Per-channel difference still treated as identical content
    #[serde(default = "default_tolerance")]
    pub tolerance: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Worker threads for tile synthesis (0 uses all cores)
    #[serde(default = "default_workers")]
    pub workers: usize,
}

/// One native zoom level's capture grid.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LevelSection {
    pub zoom: u8,
    pub rows: u32,
    pub cols: u32,

    /// Screenshot width in pixels
    #[serde(default = "default_shot_width")]
    pub width: u32,

    /// Screenshot height in pixels
    #[serde(default = "default_shot_height")]
    pub height: u32,
}

/// One display zoom level's sampling parameters.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ZoomSection {
    pub display: u8,
    pub native: u8,
    pub scale: f64,
}

// Default value functions
fn default_tile_size() -> u32 {
    DEFAULT_TILE_SIZE
}
fn default_tolerance() -> u8 {
    DEFAULT_TOLERANCE
}
fn default_workers() -> usize {
    10
}
fn default_shot_width() -> u32 {
    3840
}
fn default_shot_height() -> u32 {
    2160
}

fn default_levels() -> Vec<LevelSection> {
    [(0, 15, 13), (1, 8, 7), (2, 4, 4), (3, 2, 2), (4, 2, 2), (5, 1, 1)]
        .into_iter()
        .map(|(zoom, rows, cols)| LevelSection {
            zoom,
            rows,
            cols,
            width: default_shot_width(),
            height: default_shot_height(),
        })
        .collect()
}

fn default_zooms() -> Vec<ZoomSection> {
    [
        (0, 5, 0.5),
        (1, 4, 0.5),
        (2, 3, 0.5),
        (3, 2, 0.5),
        (4, 1, 0.5),
        (5, 0, 0.5),
        (6, 0, 1.0),
    ]
    .into_iter()
    .map(|(display, native, scale)| ZoomSection {
        display,
        native,
        scale,
    })
    .collect()
}

impl Default for TilesConfig {
    fn default() -> Self {
        Self {
            size: default_tile_size(),
            format: TileFormat::default(),
            tolerance: default_tolerance(),
        }
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tiles: TilesConfig::default(),
            layers: LayerNames::default(),
            levels: default_levels(),
            zooms: default_zooms(),
            run: RunConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from file or use defaults
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let config = match config_path {
            Some(path) => {
                log::info!("Loading configuration from: {}", path.display());
                Self::load_from_file(path)?
            }
            None => {
                // Try to find shotmap.toml in current directory
                let default_path = PathBuf::from("shotmap.toml");
                if default_path.exists() {
                    log::info!("Loading configuration from: shotmap.toml");
                    Self::load_from_file(&default_path)?
                } else {
                    log::info!("Using default configuration");
                    Self::default()
                }
            }
        };

        config.validate()?;
        Ok(config)
    }

    /// Reject geometry that tile synthesis cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.tiles.size == 0 {
            return Err(anyhow!("Tile size must be at least 1 pixel"));
        }
        for level in &self.levels {
            if level.rows == 0 || level.cols == 0 {
                return Err(anyhow!(
                    "Level {}: grid needs at least one row and one column",
                    level.zoom
                ));
            }
            if level.width == 0 || level.height == 0 {
                return Err(anyhow!(
                    "Level {}: screenshot size must be at least 1 pixel",
                    level.zoom
                ));
            }
        }
        for zoom in &self.zooms {
            if !zoom.scale.is_finite() || zoom.scale <= 0.0 {
                return Err(anyhow!(
                    "Display level {}: scale must be a positive number, got {}",
                    zoom.display,
                    zoom.scale
                ));
            }
            let entry = ZoomEntry {
                native: zoom.native,
                scale: zoom.scale,
            };
            if entry.native_tile_px(self.tiles.size) == 0 {
                return Err(anyhow!(
                    "Display level {}: scale {} leaves no native pixels per {} px tile",
                    zoom.display,
                    zoom.scale,
                    self.tiles.size
                ));
            }
        }
        Ok(())
    }

    /// Load configuration from a specific TOML file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse configuration file: {}", path.display()))?;

        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize configuration")?;

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write configuration file: {}", path.display()))?;

        Ok(())
    }

    /// Generate example configuration file content
    pub fn example_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).expect("Failed to serialize default configuration")
    }

    /// Worker thread count, resolving 0 to the machine's core count.
    pub fn workers(&self) -> usize {
        if self.run.workers == 0 {
            num_cpus::get()
        } else {
            self.run.workers
        }
    }

    /// Display-to-native zoom table built from the `[[zooms]]` rows.
    pub fn zoom_table(&self) -> ZoomTable {
        ZoomTable::from_entries(self.zooms.iter().map(|row| {
            (
                row.display,
                ZoomEntry {
                    native: row.native,
                    scale: row.scale,
                },
            )
        }))
    }

    /// Capture geometry built from the `[[levels]]` rows.
    pub fn level_specs(&self) -> Vec<LevelSpec> {
        self.levels
            .iter()
            .map(|row| LevelSpec {
                zoom: row.zoom,
                grid: GridShape {
                    rows: row.rows,
                    cols: row.cols,
                },
                image_size: ImageSize {
                    width: row.width,
                    height: row.height,
                },
            })
            .collect()
    }
}
