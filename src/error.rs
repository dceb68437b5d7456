//! Error types for mapgrid.
//!
//! Only construction, configuration and persistence can fail. Queries never
//! return errors: items that cannot be resolved or are filtered out are
//! simply treated as absent.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, MapGridError>;

#[derive(Debug, Error)]
pub enum MapGridError {
    /// World bounding box that is empty or inverted on some axis.
    #[error("invalid world bounds: horizontal {min_lon}..{max_lon}, vertical {min_lat}..{max_lat}")]
    InvalidBounds {
        min_lon: i32,
        max_lon: i32,
        min_lat: i32,
        max_lat: i32,
    },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The buffer ended before a complete table was read.
    #[error("unexpected end of buffer: needed {needed} bytes, {remaining} remaining")]
    UnexpectedEof { needed: usize, remaining: usize },

    /// The persisted table is structurally inconsistent.
    #[error("invalid hash table format: {0}")]
    InvalidFormat(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for MapGridError {
    fn from(err: serde_json::Error) -> Self {
        MapGridError::Serialization(err.to_string())
    }
}
