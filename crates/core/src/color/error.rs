//! Error types for color extraction.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while turning a photo into a dominant color.
#[derive(Debug, Error)]
pub enum ColorError {
    /// White threshold outside 0..=255.
    #[error("White threshold must be within 0..=255, got {0}")]
    InvalidThreshold(i64),

    /// Image bytes could not be decoded.
    #[error("Failed to decode image: {0}")]
    Decode(String),

    /// Every pixel was filtered out as white-like.
    #[error("No dominant color: every pixel is white-like")]
    NoDominantColor,

    /// Image file could not be read.
    #[error("Failed to read image {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
