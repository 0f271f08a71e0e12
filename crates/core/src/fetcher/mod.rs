//! Remote image retrieval.

mod error;
mod http;

pub use error::FetchError;
pub use http::HttpImageFetcher;

use async_trait::async_trait;
use std::path::Path;

/// Downloads a remote image to a local path.
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    /// Returns the name of this fetcher implementation.
    fn name(&self) -> &str;

    /// Streams `url` into `destination`, replacing its previous content.
    ///
    /// On failure `destination` is either absent or still holds the content
    /// of an earlier fetch; callers must not read it. Returns the number of
    /// bytes written.
    async fn fetch(&self, url: &str, destination: &Path) -> Result<u64, FetchError>;
}
