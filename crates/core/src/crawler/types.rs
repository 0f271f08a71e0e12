//! Types for the catalog crawler.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::Catalog;
use crate::renderer::RenderError;

/// Summary of one crawl.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlReport {
    /// Listing pages discovered.
    pub pages: u32,
    /// Detail links harvested (lot listings already removed).
    pub links: usize,
    /// Entries written to the catalog.
    pub entries: usize,
    /// Detail pages that produced no entry.
    pub skipped: usize,
    /// Wall-clock duration of the crawl.
    pub duration_ms: u64,
}

/// A finished crawl.
#[derive(Debug, Clone, Default)]
pub struct CrawlOutcome {
    pub catalog: Catalog,
    pub report: CrawlReport,
}

/// Errors raised by individual crawl steps.
///
/// None of these abort a crawl; the affected page or listing is skipped.
#[derive(Debug, Error)]
pub enum CrawlError {
    /// Navigation failed.
    #[error(transparent)]
    Render(#[from] RenderError),

    /// An expected DOM node is missing.
    #[error("Element {selector:?} not found on {url}")]
    ElementNotFound { url: String, selector: String },

    /// The listing is a lot/bundle/accessory.
    #[error("Listing {title:?} rejected by lot filter")]
    Filtered { title: String },

    /// A configured CSS selector does not parse.
    #[error("Invalid selector {selector:?}: {reason}")]
    InvalidSelector { selector: String, reason: String },

    /// The lot vocabulary does not compile.
    #[error("Invalid lot vocabulary: {0}")]
    InvalidLotVocabulary(String),
}
