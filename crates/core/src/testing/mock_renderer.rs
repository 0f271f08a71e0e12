//! Scripted render session for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use crate::renderer::{PageRenderer, RenderError, RenderedPage};

/// What a scripted URL answers with.
#[derive(Debug, Clone, Default)]
struct ScriptedPage {
    html: Option<String>,
    status: Option<u16>,
    delay: Option<Duration>,
}

/// Mock implementation of the PageRenderer trait.
///
/// Serves canned HTML per URL. Unscripted URLs answer with HTTP 404, and
/// every navigation is recorded in a log shared by clones of the session.
///
/// # Example
///
/// ```rust,ignore
/// use yarnhue_core::testing::{fixtures, ScriptedRenderer};
///
/// let renderer = ScriptedRenderer::new()
///     .with_page("https://shop.test/yarn/page/1", fixtures::listing_page(&[("Red", "/yarn/red")]))
///     .with_failure("https://shop.test/yarn/page/2", 503);
/// let log = renderer.navigation_log();
/// ```
#[derive(Debug, Clone, Default)]
pub struct ScriptedRenderer {
    pages: HashMap<String, ScriptedPage>,
    log: Arc<Mutex<Vec<String>>>,
}

impl ScriptedRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `url` with `html`.
    pub fn with_page(mut self, url: &str, html: impl Into<String>) -> Self {
        let page = self.pages.entry(url.to_string()).or_default();
        page.html = Some(html.into());
        page.status = None;
        self
    }

    /// Answer `url` with a non-success status.
    pub fn with_failure(mut self, url: &str, status: u16) -> Self {
        let page = self.pages.entry(url.to_string()).or_default();
        page.html = None;
        page.status = Some(status);
        self
    }

    /// Delay the answer for `url`.
    pub fn with_delay(mut self, url: &str, delay: Duration) -> Self {
        self.pages.entry(url.to_string()).or_default().delay = Some(delay);
        self
    }

    /// URLs navigated so far, in order.
    pub fn navigation_log(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.log)
    }
}

#[async_trait]
impl PageRenderer for ScriptedRenderer {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn render(&mut self, url: &str) -> Result<RenderedPage, RenderError> {
        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(url.to_string());

        let page = self.pages.get(url).cloned().unwrap_or_default();
        if let Some(delay) = page.delay {
            tokio::time::sleep(delay).await;
        }

        match (page.html, page.status) {
            (Some(html), None) => Ok(RenderedPage::new(url, html)),
            (_, status) => Err(RenderError::Status {
                url: url.to_string(),
                status: status.unwrap_or(404),
            }),
        }
    }
}
