//! Screenshot discovery and access.
//!
//! Source files are named `{index}-{layer}-{zoom}.png`, where the leading
//! numeric token is the screenshot's row-major grid index. Grids are sparse:
//! a missing index is normal and reads as fully transparent content, while a
//! file that exists but fails to decode is a data-integrity error.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use image::RgbaImage;
use serde::{Deserialize, Serialize};

use crate::error::{TileError, TileResult};
use crate::types::{GridShape, ImageSize, Layer, NativeZoom};

/// Filename tokens for the three layer roles. The same tokens name the
/// output directories of the pyramid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerNames {
    pub surface: String,
    pub hollow: String,
    pub cave: String,
}

impl LayerNames {
    pub fn token(&self, layer: Layer) -> &str {
        match layer {
            Layer::Surface => &self.surface,
            Layer::Hollow => &self.hollow,
            Layer::Cave => &self.cave,
        }
    }

    pub fn layer_of(&self, token: &str) -> Option<Layer> {
        if token == self.surface {
            Some(Layer::Surface)
        } else if token == self.hollow {
            Some(Layer::Hollow)
        } else if token == self.cave {
            Some(Layer::Cave)
        } else {
            None
        }
    }
}

impl Default for LayerNames {
    fn default() -> Self {
        Self {
            surface: Layer::Surface.as_str().to_string(),
            hollow: Layer::Hollow.as_str().to_string(),
            cave: Layer::Cave.as_str().to_string(),
        }
    }
}

/// Capture geometry for one native zoom level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelSpec {
    pub zoom: NativeZoom,
    pub grid: GridShape,
    pub image_size: ImageSize,
}

/// Read access to one native zoom level's screenshots for tile synthesis.
///
/// `load` distinguishes a missing screenshot (`Ok(None)`, stitched as
/// transparency) from an unreadable one (`Err`, fatal for the tile).
pub trait ScreenshotSource: Sync {
    /// Pixel size of every screenshot at this level.
    fn image_size(&self) -> ImageSize;

    /// Grid shape of this level.
    fn grid(&self) -> GridShape;

    /// Decode the screenshot at `index` for `layer`.
    fn load(&self, layer: Layer, index: usize) -> TileResult<Option<RgbaImage>>;
}

/// One native zoom level's screenshots on disk.
#[derive(Debug, Clone)]
pub struct LevelCatalog {
    spec: LevelSpec,
    files: HashMap<Layer, BTreeMap<usize, PathBuf>>,
}

impl LevelCatalog {
    fn new(spec: LevelSpec) -> Self {
        let files = Layer::ALL
            .into_iter()
            .map(|layer| (layer, BTreeMap::new()))
            .collect();
        Self { spec, files }
    }

    pub fn spec(&self) -> LevelSpec {
        self.spec
    }

    /// Number of screenshots present for a layer.
    pub fn count(&self, layer: Layer) -> usize {
        self.files.get(&layer).map_or(0, BTreeMap::len)
    }

    /// Grid indices with no screenshot for a layer, in ascending order.
    pub fn missing_indices(&self, layer: Layer) -> Vec<usize> {
        let present = &self.files[&layer];
        (0..self.spec.grid.cell_count())
            .filter(|index| !present.contains_key(index))
            .collect()
    }

    fn insert(&mut self, layer: Layer, index: usize, path: PathBuf) {
        if let Some(map) = self.files.get_mut(&layer) {
            map.insert(index, path);
        }
    }
}

impl ScreenshotSource for LevelCatalog {
    fn image_size(&self) -> ImageSize {
        self.spec.image_size
    }

    fn grid(&self) -> GridShape {
        self.spec.grid
    }

    fn load(&self, layer: Layer, index: usize) -> TileResult<Option<RgbaImage>> {
        let Some(path) = self.files.get(&layer).and_then(|m| m.get(&index)) else {
            return Ok(None);
        };
        let img = image::open(path).map_err(|source| TileError::Decode {
            path: path.clone(),
            source,
        })?;
        Ok(Some(img.into_rgba8()))
    }
}

/// All native zoom levels' screenshots, scanned from one directory.
#[derive(Debug, Clone)]
pub struct ScreenshotCatalog {
    levels: BTreeMap<NativeZoom, LevelCatalog>,
}

impl ScreenshotCatalog {
    /// Scan a directory for screenshots of every configured level.
    ///
    /// Files that are not screenshots for a configured level and layer are
    /// ignored; `.png` files that look like screenshots but do not parse are
    /// logged and skipped.
    pub fn scan(dir: &Path, specs: &[LevelSpec], names: &LayerNames) -> TileResult<Self> {
        let mut levels: BTreeMap<NativeZoom, LevelCatalog> = specs
            .iter()
            .map(|&spec| (spec.zoom, LevelCatalog::new(spec)))
            .collect();

        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if !name.ends_with(".png") {
                continue;
            }
            let Some((index, layer, zoom)) = parse_screenshot_name(name, names) else {
                log::warn!("Skipping unrecognized screenshot name: {}", name);
                continue;
            };
            match levels.get_mut(&zoom) {
                Some(level) => level.insert(layer, index, path),
                None => log::debug!("Ignoring {}: no configured level for zoom {}", name, zoom),
            }
        }

        for level in levels.values() {
            log::debug!(
                "Native level {}: {} surface, {} hollow, {} cave screenshots",
                level.spec.zoom,
                level.count(Layer::Surface),
                level.count(Layer::Hollow),
                level.count(Layer::Cave),
            );
        }

        Ok(Self { levels })
    }

    /// Look up one native level's catalog.
    pub fn level(&self, zoom: NativeZoom) -> TileResult<&LevelCatalog> {
        self.levels.get(&zoom).ok_or(TileError::UnknownLevel(zoom))
    }

    /// Levels in ascending native zoom order.
    pub fn levels(&self) -> impl Iterator<Item = &LevelCatalog> {
        self.levels.values()
    }
}

/// Split `{index}-{token}-{zoom}.png` into its parts. Tokens may themselves
/// contain separators; the index is everything before the first `-` and the
/// zoom everything after the last.
fn parse_screenshot_name(name: &str, names: &LayerNames) -> Option<(usize, Layer, NativeZoom)> {
    let stem = name.strip_suffix(".png")?;
    let (index_str, rest) = stem.split_once('-')?;
    let (token, zoom_str) = rest.rsplit_once('-')?;
    let index = index_str.parse().ok()?;
    let zoom = zoom_str.parse().ok()?;
    let layer = names.layer_of(token)?;
    Some((index, layer, zoom))
}

/// Screenshot source backed by in-memory images, for synthetic grids.
#[derive(Debug, Clone)]
pub struct MemorySource {
    image_size: ImageSize,
    grid: GridShape,
    images: HashMap<(Layer, usize), RgbaImage>,
}

impl MemorySource {
    pub fn new(image_size: ImageSize, grid: GridShape) -> Self {
        Self {
            image_size,
            grid,
            images: HashMap::new(),
        }
    }

    pub fn insert(&mut self, layer: Layer, index: usize, image: RgbaImage) {
        self.images.insert((layer, index), image);
    }
}

impl ScreenshotSource for MemorySource {
    fn image_size(&self) -> ImageSize {
        self.image_size
    }

    fn grid(&self) -> GridShape {
        self.grid
    }

    fn load(&self, layer: Layer, index: usize) -> TileResult<Option<RgbaImage>> {
        Ok(self.images.get(&(layer, index)).cloned())
    }
}
