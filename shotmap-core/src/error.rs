//! Error types for tile synthesis.

use std::path::PathBuf;
use thiserror::Error;

use crate::types::{DisplayZoom, NativeZoom};

/// Errors that can occur during catalog access and tile synthesis
#[derive(Debug, Error)]
pub enum TileError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to decode screenshot {path}: {source}")]
    Decode {
        path: PathBuf,
        source: image::ImageError,
    },

    #[error("Failed to encode tile {path}: {source}")]
    Encode {
        path: PathBuf,
        source: image::ImageError,
    },

    #[error("No zoom table entry for display level {0}")]
    UnmappedZoom(DisplayZoom),

    #[error("No catalog level for native zoom {0}")]
    UnknownLevel(NativeZoom),

    #[error("Image size mismatch: {0}x{1} vs {2}x{3}")]
    SizeMismatch(u32, u32, u32, u32),

    #[error("Report serialization error: {0}")]
    Report(#[from] serde_json::Error),
}

pub type TileResult<T> = Result<T, TileError>;
