//! A rendered document.

use scraper::Html;
use url::Url;

/// HTML produced by navigating to `url`.
///
/// The parsed DOM (`scraper::Html`) is not `Send`, so the page keeps the raw
/// markup and parses on demand inside synchronous extraction code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPage {
    pub url: String,
    pub html: String,
}

impl RenderedPage {
    pub fn new(url: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            html: html.into(),
        }
    }

    /// Parses the markup into a queryable document.
    pub fn document(&self) -> Html {
        Html::parse_document(&self.html)
    }

    /// Resolves a possibly relative link against the page URL.
    ///
    /// Returns `None` for empty links or links that cannot be resolved.
    pub fn resolve_link(&self, href: &str) -> Option<String> {
        let href = href.trim();
        if href.is_empty() {
            return None;
        }
        match Url::parse(&self.url) {
            Ok(base) => base.join(href).ok().map(String::from),
            Err(_) => Url::parse(href).ok().map(String::from),
        }
    }
}
