//! Error types for hex map generation and triangulation

use std::fmt;

/// Errors that can occur during map generation or grid construction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HexMapError {
    /// Configuration validation failed
    InvalidConfig(String),
    /// Requested map dimensions are unusable (non-positive or not a
    /// multiple of the chunk size)
    InvalidMapSize { width: i32, height: i32 },
    /// The frontier priority queue was dequeued while empty, which means
    /// the calling search asked for candidates it never enqueued
    EmptyFrontier,
}

impl fmt::Display for HexMapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HexMapError::InvalidConfig(msg) => write!(f, "invalid configuration: {}", msg),
            HexMapError::InvalidMapSize { width, height } => {
                write!(f, "invalid map size: {}x{}", width, height)
            }
            HexMapError::EmptyFrontier => write!(f, "dequeued an empty search frontier"),
        }
    }
}

impl std::error::Error for HexMapError {}

/// Result type alias for hex map operations
pub type Result<T> = std::result::Result<T, HexMapError>;
