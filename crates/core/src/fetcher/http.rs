//! HTTP image fetcher.

use async_trait::async_trait;
use reqwest::Client;
use std::path::Path;
use std::time::Duration;
use tempfile::TempPath;
use tokio::fs::{self, File};
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::debug;

use super::{FetchError, ImageFetcher};

/// Streams images over HTTP into local files.
pub struct HttpImageFetcher {
    client: Client,
    timeout_secs: u64,
}

impl HttpImageFetcher {
    /// Create a new fetcher with a per-request deadline.
    pub fn new(user_agent: &str, timeout_secs: u64) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(user_agent.to_string())
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| FetchError::Request {
                url: String::new(),
                reason: format!("failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            timeout_secs,
        })
    }

    fn map_request_error(&self, url: &str, e: reqwest::Error) -> FetchError {
        if e.is_timeout() {
            FetchError::Timeout {
                url: url.to_string(),
                timeout_secs: self.timeout_secs,
            }
        } else {
            FetchError::Request {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    }

    /// Temporary sibling of `destination` used while the body streams in.
    ///
    /// The file is deleted when the returned path is dropped, so a fetch
    /// that is cancelled mid-stream leaves nothing behind.
    fn partial_file(destination: &Path) -> Result<(std::fs::File, TempPath), FetchError> {
        let parent = destination.parent().unwrap_or_else(|| Path::new("."));
        let mut prefix = destination
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        prefix.push(".");

        let partial = tempfile::Builder::new()
            .prefix(&prefix)
            .suffix(".part")
            .tempfile_in(parent)
            .map_err(|e| FetchError::io(parent, e))?;
        Ok(partial.into_parts())
    }

    async fn stream_to(
        &self,
        url: &str,
        mut response: reqwest::Response,
        file: std::fs::File,
        partial: &Path,
    ) -> Result<u64, FetchError> {
        let mut writer = BufWriter::new(File::from_std(file));
        let mut total_bytes = 0u64;

        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| self.map_request_error(url, e))?
        {
            writer
                .write_all(&chunk)
                .await
                .map_err(|e| FetchError::io(partial, e))?;
            total_bytes += chunk.len() as u64;
        }

        writer.flush().await.map_err(|e| FetchError::io(partial, e))?;
        Ok(total_bytes)
    }
}

#[async_trait]
impl ImageFetcher for HttpImageFetcher {
    fn name(&self) -> &str {
        "http"
    }

    async fn fetch(&self, url: &str, destination: &Path) -> Result<u64, FetchError> {
        debug!(url = url, destination = %destination.display(), "Fetching image");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.map_request_error(url, e))?;

        if !response.status().is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| FetchError::io(parent, e))?;
        }

        let (file, partial) = Self::partial_file(destination)?;
        let total_bytes = self.stream_to(url, response, file, &partial).await?;

        partial
            .persist(destination)
            .map_err(|e| FetchError::io(destination, e.error))?;

        debug!(url = url, bytes = total_bytes, "Image fetched");
        Ok(total_bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt as _};
    use tokio::net::TcpListener;

    /// Serves one canned HTTP response per connection and returns the base URL.
    async fn serve(status_line: &'static str, body: &'static [u8]) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let mut buf = [0u8; 1024];
                let _ = socket.read(&mut buf).await;
                let head = format!(
                    "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                    status_line,
                    body.len()
                );
                let _ = socket.write_all(head.as_bytes()).await;
                let _ = socket.write_all(body).await;
                let _ = socket.shutdown().await;
            }
        });
        format!("http://{}", addr)
    }

    /// Announces `length` bytes, sends `head` of them, then stalls.
    async fn serve_stalled(length: usize, head: &'static [u8]) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                tokio::spawn(async move {
                    let mut buf = [0u8; 1024];
                    let _ = socket.read(&mut buf).await;
                    let headers = format!("HTTP/1.1 200 OK\r\nContent-Length: {}\r\n\r\n", length);
                    let _ = socket.write_all(headers.as_bytes()).await;
                    let _ = socket.write_all(head).await;
                    let _ = socket.flush().await;
                    tokio::time::sleep(Duration::from_secs(60)).await;
                });
            }
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_fetch_writes_body_and_overwrites() {
        let base = serve("200 OK", b"fresh-bytes").await;
        let dir = tempfile::TempDir::new().unwrap();
        let destination = dir.path().join("img.jpg");
        std::fs::write(&destination, b"stale content that is longer").unwrap();

        let fetcher = HttpImageFetcher::new("yarnhue-test", 5).unwrap();
        let written = fetcher
            .fetch(&format!("{}/swatch.jpg", base), &destination)
            .await
            .unwrap();

        assert_eq!(written, 11);
        assert_eq!(std::fs::read(&destination).unwrap(), b"fresh-bytes");
        // Only the destination remains; no partial files.
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn test_non_success_status_is_failure() {
        let base = serve("404 Not Found", b"missing").await;
        let dir = tempfile::TempDir::new().unwrap();
        let destination = dir.path().join("img.jpg");
        std::fs::write(&destination, b"previous").unwrap();

        let fetcher = HttpImageFetcher::new("yarnhue-test", 5).unwrap();
        let result = fetcher
            .fetch(&format!("{}/gone.jpg", base), &destination)
            .await;

        assert!(matches!(result, Err(FetchError::Status { status: 404, .. })));
        assert_eq!(std::fs::read(&destination).unwrap(), b"previous");
    }

    #[tokio::test]
    async fn test_fetch_creates_destination_directory() {
        let base = serve("200 OK", b"abc").await;
        let dir = tempfile::TempDir::new().unwrap();
        let destination = dir.path().join("images/deep/img.jpg");

        let fetcher = HttpImageFetcher::new("yarnhue-test", 5).unwrap();
        fetcher
            .fetch(&format!("{}/a.jpg", base), &destination)
            .await
            .unwrap();
        assert_eq!(std::fs::read(&destination).unwrap(), b"abc");
    }

    #[test]
    fn test_partial_file_is_sibling_and_removed_on_drop() {
        let dir = tempfile::TempDir::new().unwrap();
        let destination = dir.path().join("entry-3.img");

        let (_file, partial) = HttpImageFetcher::partial_file(&destination).unwrap();
        assert_eq!(partial.parent(), Some(dir.path()));
        let name = partial.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("entry-3.img."));
        assert!(name.ends_with(".part"));
        assert!(partial.exists());

        drop(partial);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_cancelled_fetch_leaves_no_partial_file() {
        let base = serve_stalled(100_000, b"abc").await;
        let dir = tempfile::TempDir::new().unwrap();
        let destination = dir.path().join("img.jpg");

        let fetcher = HttpImageFetcher::new("yarnhue-test", 30).unwrap();
        let result = tokio::time::timeout(
            Duration::from_millis(300),
            fetcher.fetch(&format!("{}/slow.jpg", base), &destination),
        )
        .await;

        assert!(result.is_err());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_transport_error_leaves_destination_untouched() {
        let dir = tempfile::TempDir::new().unwrap();
        let destination = dir.path().join("img.jpg");
        std::fs::write(&destination, b"previous").unwrap();

        let fetcher = HttpImageFetcher::new("yarnhue-test", 2).unwrap();
        // Port 9 (discard) on localhost is not expected to speak HTTP.
        let result = fetcher
            .fetch("http://127.0.0.1:9/swatch.jpg", &destination)
            .await;

        assert!(result.is_err());
        assert_eq!(std::fs::read(&destination).unwrap(), b"previous");
    }
}
