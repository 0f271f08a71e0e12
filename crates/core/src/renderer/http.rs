//! Plain HTTP render session.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

use crate::config::CrawlerConfig;

use super::{PageRenderer, RenderError, RenderedPage};

/// Render session backed by a plain HTTP GET.
///
/// Serves server-rendered catalogs. Sites that build their listings with
/// JavaScript need a browser-driven [`PageRenderer`] instead.
pub struct HttpRenderer {
    client: Client,
    timeout_secs: u64,
}

impl HttpRenderer {
    /// Create a new HttpRenderer with the given configuration.
    pub fn new(config: &CrawlerConfig) -> Result<Self, RenderError> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .cookie_store(true)
            .build()
            .map_err(|e| RenderError::Request {
                url: String::new(),
                reason: format!("failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            timeout_secs: config.request_timeout_secs,
        })
    }

    /// Builds `count` independent sessions for a [`super::RendererPool`].
    pub fn sessions(config: &CrawlerConfig, count: usize) -> Result<Vec<Self>, RenderError> {
        (0..count).map(|_| Self::new(config)).collect()
    }
}

#[async_trait]
impl PageRenderer for HttpRenderer {
    fn name(&self) -> &str {
        "http"
    }

    async fn render(&mut self, url: &str) -> Result<RenderedPage, RenderError> {
        let parsed = url::Url::parse(url).map_err(|e| RenderError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        debug!(url = url, "Rendering page");

        let response = self.client.get(parsed).send().await.map_err(|e| {
            if e.is_timeout() {
                RenderError::Timeout {
                    url: url.to_string(),
                    timeout_secs: self.timeout_secs,
                }
            } else {
                RenderError::Request {
                    url: url.to_string(),
                    reason: e.to_string(),
                }
            }
        })?;

        if !response.status().is_success() {
            return Err(RenderError::Status {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        let final_url = response.url().to_string();
        let html = response.text().await.map_err(|e| RenderError::Body {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        Ok(RenderedPage::new(final_url, html))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_invalid_url_rejected_before_request() {
        let mut renderer = HttpRenderer::new(&CrawlerConfig::default()).unwrap();
        let result = renderer.render("not a url").await;
        assert!(matches!(result, Err(RenderError::InvalidUrl { .. })));
    }

    #[test]
    fn test_sessions_builds_requested_count() {
        let sessions = HttpRenderer::sessions(&CrawlerConfig::default(), 3).unwrap();
        assert_eq!(sessions.len(), 3);
        assert_eq!(sessions[0].name(), "http");
    }
}
