//! Error types for image retrieval.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while downloading an image.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Transport-level failure.
    #[error("Request to {url} failed: {reason}")]
    Request { url: String, reason: String },

    /// Non-success HTTP status.
    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    /// Download did not finish before the deadline.
    #[error("Fetching {url} timed out after {timeout_secs}s")]
    Timeout { url: String, timeout_secs: u64 },

    /// Local file could not be written.
    #[error("Failed to write {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl FetchError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
