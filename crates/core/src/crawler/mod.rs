//! Catalog crawler.
//!
//! Walks a paginated listing site through [`PageRenderer`] sessions:
//! discovers how many pages carry listings, harvests detail links, and
//! extracts a name and photo URL from each detail page. Every page and
//! listing is fault-isolated; failures are logged and skipped.

mod catalog_crawler;
mod lot_filter;
mod types;

pub use catalog_crawler::CatalogCrawler;
pub use lot_filter::LotFilter;
pub use types::*;

use async_trait::async_trait;

use crate::renderer::PageRenderer;

/// Something that can produce a fresh catalog.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Crawls the whole catalog. Never fails as a whole; skipped pages and
    /// listings are reflected in the report.
    async fn crawl(&self) -> CrawlOutcome;
}

#[async_trait]
impl<R: PageRenderer + 'static> CatalogSource for CatalogCrawler<R> {
    async fn crawl(&self) -> CrawlOutcome {
        CatalogCrawler::crawl(self).await
    }
}
