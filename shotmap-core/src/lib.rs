//! Shotmap Core Library
//!
//! Turns grids of game map screenshots into a slippy-map tile pyramid:
//! screenshot discovery, seam-free stitching, gamma-aware resampling, layer
//! filtering, and parallel pyramid synthesis.

pub mod types;
pub mod error;
pub mod zoom;
pub mod coords;
pub mod raster;
pub mod resample;
pub mod stitch;
pub mod catalog;
pub mod compose;
pub mod writer;
pub mod pipeline;

// Re-export commonly used types and functions
pub use types::{DisplayZoom, GridShape, ImageSize, Layer, NativeZoom, PixelRect, TileCoord};
pub use error::{TileError, TileResult};
pub use zoom::{ZoomEntry, ZoomTable};
pub use catalog::{LayerNames, LevelSpec, ScreenshotCatalog, ScreenshotSource};
pub use compose::{synthesize_tile, SynthesisParams};
pub use writer::{TileFormat, TileWriter};
pub use pipeline::{PyramidBuilder, RunReport};

/// Version information for the shotmap core library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
