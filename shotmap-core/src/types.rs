use serde::{Deserialize, Serialize};
use std::fmt;

pub type NativeZoom = u8;
pub type DisplayZoom = u8;

/// Terrain layer roles captured for every screenshot grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layer {
    Surface,
    Hollow,
    Cave,
}

impl Layer {
    pub const ALL: [Layer; 3] = [Layer::Surface, Layer::Hollow, Layer::Cave];

    pub fn as_str(&self) -> &'static str {
        match self {
            Layer::Surface => "surface",
            Layer::Hollow => "hollow",
            Layer::Cave => "cave",
        }
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One output tile's position in the pyramid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileCoord {
    pub zoom: DisplayZoom,
    pub col: u32,
    pub row: u32,
}

/// Axis-aligned rectangle in stitched-canvas pixel coordinates.
///
/// The origin may be negative: tile synthesis deliberately requests one
/// tile's worth of margin beyond the canvas edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelRect {
    pub x: i64,
    pub y: i64,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    pub fn right(&self) -> i64 {
        self.x + self.width as i64
    }

    pub fn bottom(&self) -> i64 {
        self.y + self.height as i64
    }
}

/// Screenshot grid shape of one native zoom level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridShape {
    pub rows: u32,
    pub cols: u32,
}

impl GridShape {
    pub fn cell_count(&self) -> usize {
        self.rows as usize * self.cols as usize
    }
}

/// Pixel dimensions of one screenshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}
