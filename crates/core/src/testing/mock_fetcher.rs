//! Mock image fetcher for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use crate::fetcher::{FetchError, ImageFetcher};

#[derive(Debug, Clone, Default)]
struct MockImage {
    bytes: Option<Vec<u8>>,
    status: Option<u16>,
    delay: Option<Duration>,
}

/// Mock implementation of the ImageFetcher trait.
///
/// Provides controllable behavior for testing:
/// - Serve canned bytes per URL (unknown URLs answer HTTP 404)
/// - Delay individual downloads
/// - Record fetched URLs and the peak number of concurrent fetches
#[derive(Debug, Default)]
pub struct MockImageFetcher {
    images: HashMap<String, MockImage>,
    fetched: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

/// Decrements the in-flight counter when a fetch ends, even if cancelled.
struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl MockImageFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `bytes` for `url`.
    pub fn with_image(mut self, url: &str, bytes: Vec<u8>) -> Self {
        let image = self.images.entry(url.to_string()).or_default();
        image.bytes = Some(bytes);
        image.status = None;
        self
    }

    /// Answer `url` with a non-success status.
    pub fn with_failure(mut self, url: &str, status: u16) -> Self {
        let image = self.images.entry(url.to_string()).or_default();
        image.bytes = None;
        image.status = Some(status);
        self
    }

    /// Delay the download of `url`.
    pub fn with_delay(mut self, url: &str, delay: Duration) -> Self {
        self.images.entry(url.to_string()).or_default().delay = Some(delay);
        self
    }

    /// URLs requested so far, in request order.
    pub fn fetched_urls(&self) -> Vec<String> {
        self.fetched
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Highest number of fetches observed running at once.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ImageFetcher for MockImageFetcher {
    fn name(&self) -> &str {
        "mock"
    }

    async fn fetch(&self, url: &str, destination: &Path) -> Result<u64, FetchError> {
        self.fetched
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(url.to_string());

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        let _guard = InFlight(&self.in_flight);
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        let image = self.images.get(url).cloned().unwrap_or_default();
        if let Some(delay) = image.delay {
            tokio::time::sleep(delay).await;
        }

        let Some(bytes) = image.bytes else {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: image.status.unwrap_or(404),
            });
        };

        if let Some(parent) = destination.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| FetchError::io(parent, e))?;
        }
        tokio::fs::write(destination, &bytes)
            .await
            .map_err(|e| FetchError::io(destination, e))?;

        Ok(bytes.len() as u64)
    }
}

