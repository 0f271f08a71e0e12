//! Error types for page rendering.

use thiserror::Error;

/// Errors that can occur while navigating a render session.
#[derive(Debug, Clone, Error)]
pub enum RenderError {
    /// The URL could not be parsed.
    #[error("Invalid URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// Transport-level failure.
    #[error("Request to {url} failed: {reason}")]
    Request { url: String, reason: String },

    /// The server answered with a non-success status.
    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    /// Navigation did not finish before the deadline.
    #[error("Rendering {url} timed out after {timeout_secs}s")]
    Timeout { url: String, timeout_secs: u64 },

    /// The response body could not be read.
    #[error("Failed to read body of {url}: {reason}")]
    Body { url: String, reason: String },

    /// The session is no longer usable.
    #[error("Render session closed")]
    SessionClosed,
}
