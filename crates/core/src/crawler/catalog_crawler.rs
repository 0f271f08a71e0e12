//! Paginated catalog crawler.

use std::time::{Duration, Instant};

use futures::stream::{self, StreamExt};
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info, warn};

use crate::catalog::{Catalog, CatalogEntry};
use crate::config::CrawlerConfig;
use crate::renderer::{PageRenderer, RenderError, RenderedPage, RendererPool};

use super::lot_filter::LotFilter;
use super::types::{CrawlError, CrawlOutcome, CrawlReport};

/// Parsed CSS selectors for the listing and detail pages.
#[derive(Debug, Clone)]
struct CrawlSelectors {
    listing: Selector,
    listing_link: Selector,
    title: Selector,
    image: Selector,
}

impl CrawlSelectors {
    fn from_config(config: &CrawlerConfig) -> Result<Self, CrawlError> {
        Ok(Self {
            listing: parse_selector(&config.listing_selector)?,
            listing_link: parse_selector(&config.listing_link_selector)?,
            title: parse_selector(&config.title_selector)?,
            image: parse_selector(&config.image_selector)?,
        })
    }
}

fn parse_selector(selector: &str) -> Result<Selector, CrawlError> {
    Selector::parse(selector).map_err(|e| CrawlError::InvalidSelector {
        selector: selector.to_string(),
        reason: e.to_string(),
    })
}

/// Visible text of an element with whitespace collapsed.
fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Drives render sessions over a paginated catalog and turns detail pages
/// into [`CatalogEntry`] records.
pub struct CatalogCrawler<R> {
    config: CrawlerConfig,
    pool: RendererPool<R>,
    selectors: CrawlSelectors,
    lot_filter: LotFilter,
    timeout: Duration,
}

impl<R: PageRenderer> CatalogCrawler<R> {
    /// Creates a crawler over the given session pool.
    pub fn new(config: CrawlerConfig, pool: RendererPool<R>) -> Result<Self, CrawlError> {
        let selectors = CrawlSelectors::from_config(&config)?;
        let lot_filter = LotFilter::new(&config.lot_vocabulary)
            .map_err(|e| CrawlError::InvalidLotVocabulary(e.to_string()))?;
        let timeout = Duration::from_secs(config.request_timeout_secs);

        Ok(Self {
            config,
            pool,
            selectors,
            lot_filter,
            timeout,
        })
    }

    pub fn config(&self) -> &CrawlerConfig {
        &self.config
    }

    pub fn lot_filter(&self) -> &LotFilter {
        &self.lot_filter
    }

    /// Navigates one session, bounded by the per-request deadline.
    async fn navigate(&self, session: &mut R, url: &str) -> Result<RenderedPage, CrawlError> {
        match tokio::time::timeout(self.timeout, session.render(url)).await {
            Ok(result) => result.map_err(CrawlError::from),
            Err(_) => Err(CrawlError::Render(RenderError::Timeout {
                url: url.to_string(),
                timeout_secs: self.timeout.as_secs(),
            })),
        }
    }

    /// Checks out a session for a single navigation.
    async fn render(&self, url: &str) -> Result<RenderedPage, CrawlError> {
        let mut session = self.pool.checkout().await?;
        self.navigate(&mut session, url).await
    }

    /// Number of listing anchors in a page's container.
    fn listing_count(&self, page: &RenderedPage) -> Result<usize, CrawlError> {
        let document = page.document();
        let container = self.listing_container(&document, page)?;
        Ok(container.select(&self.selectors.listing_link).count())
    }

    fn listing_container<'a>(
        &self,
        document: &'a Html,
        page: &RenderedPage,
    ) -> Result<ElementRef<'a>, CrawlError> {
        document
            .select(&self.selectors.listing)
            .next()
            .ok_or_else(|| CrawlError::ElementNotFound {
                url: page.url.clone(),
                selector: self.config.listing_selector.clone(),
            })
    }

    /// Detail links of one listing page, lot listings removed.
    fn page_links(&self, page: &RenderedPage) -> Result<Vec<String>, CrawlError> {
        let document = page.document();
        let container = self.listing_container(&document, page)?;

        let mut links = Vec::new();
        for anchor in container.select(&self.selectors.listing_link) {
            let text = element_text(anchor);
            if self.lot_filter.is_lot(&text) {
                debug!(title = %text, "Skipping lot listing");
                continue;
            }
            match anchor.value().attr("href").and_then(|h| page.resolve_link(h)) {
                Some(link) => links.push(link),
                None => debug!(title = %text, page = %page.url, "Listing anchor without usable href"),
            }
        }
        Ok(links)
    }

    /// Builds an entry from a rendered detail page.
    fn parse_detail(&self, url: &str, page: &RenderedPage) -> Result<CatalogEntry, CrawlError> {
        let document = page.document();

        let image = document
            .select(&self.selectors.image)
            .next()
            .ok_or_else(|| CrawlError::ElementNotFound {
                url: url.to_string(),
                selector: self.config.image_selector.clone(),
            })?;

        let title = document
            .select(&self.selectors.title)
            .next()
            .map(element_text)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| CrawlError::ElementNotFound {
                url: url.to_string(),
                selector: self.config.title_selector.clone(),
            })?;

        if self.lot_filter.is_lot(&title) {
            return Err(CrawlError::Filtered { title });
        }

        let image_url = image
            .value()
            .attr("src")
            .or_else(|| image.value().attr("data-src"))
            .and_then(|src| page.resolve_link(src));

        Ok(CatalogEntry::new(url, title, image_url))
    }

    /// Counts the leading pages that carry listings.
    ///
    /// Stops at the first page without listings, or at `max_pages`. A page
    /// that fails to render counts as empty. Always returns at least 1.
    pub async fn discover_page_count(&self) -> u32 {
        info!("Discovering catalog pages");

        let mut session = match self.pool.checkout().await {
            Ok(session) => session,
            Err(e) => {
                warn!(error = %e, "No render session available for page discovery");
                return 1;
            }
        };

        let mut non_empty = 0;
        for page_number in 1..=self.config.max_pages {
            let url = self.config.page_url(page_number);
            let listings = match self.navigate(&mut session, &url).await {
                Ok(page) => self.listing_count(&page),
                Err(e) => Err(e),
            };

            match listings {
                Ok(0) => {
                    debug!(page = page_number, "Listing container is empty");
                    break;
                }
                Ok(count) => {
                    debug!(page = page_number, listings = count, "Page has listings");
                    non_empty = page_number;
                }
                Err(e) => {
                    warn!(page = page_number, error = %e, "Treating page as empty");
                    break;
                }
            }
        }

        if non_empty == self.config.max_pages {
            warn!(
                max_pages = self.config.max_pages,
                "Page discovery hit the page cap"
            );
        }

        let page_count = non_empty.max(1);
        info!(pages = page_count, "Page discovery finished");
        page_count
    }

    async fn harvest_page(&self, page_number: u32) -> Vec<String> {
        let url = self.config.page_url(page_number);
        let links = match self.render(&url).await {
            Ok(page) => self.page_links(&page),
            Err(e) => Err(e),
        };

        match links {
            Ok(links) => {
                debug!(page = page_number, links = links.len(), "Scanned listing page");
                links
            }
            Err(e) => {
                warn!(page = page_number, error = %e, "Skipping listing page");
                Vec::new()
            }
        }
    }

    /// Collects detail links from pages `1..=page_count` in page order.
    ///
    /// Lot listings are dropped, duplicates are kept, and pages that fail
    /// are skipped.
    pub async fn harvest_links(&self, page_count: u32) -> Vec<String> {
        info!(pages = page_count, "Harvesting listing links");

        let pages: Vec<_> = (1..=page_count).map(|p| self.harvest_page(p)).collect();
        let per_page: Vec<Vec<String>> = stream::iter(pages)
            .buffered(self.pool.size().max(1))
            .collect()
            .await;

        let links: Vec<String> = per_page.into_iter().flatten().collect();
        info!(links = links.len(), "Link harvest finished");
        links
    }

    async fn try_extract_detail(&self, url: &str) -> Result<CatalogEntry, CrawlError> {
        let page = self.render(url).await?;
        self.parse_detail(url, &page)
    }

    /// Renders one detail page and extracts its name and photo URL.
    ///
    /// Returns `None` when the page fails to render, an expected element is
    /// missing, or the title is a lot listing.
    pub async fn extract_detail(&self, url: &str) -> Option<CatalogEntry> {
        match self.try_extract_detail(url).await {
            Ok(entry) => {
                debug!(url = url, name = %entry.name, "Extracted listing");
                Some(entry)
            }
            Err(CrawlError::Filtered { title }) => {
                debug!(url = url, title = %title, "Detail page is a lot listing");
                None
            }
            Err(e) => {
                warn!(url = url, error = %e, "Skipping detail page");
                None
            }
        }
    }

    /// Full crawl: discover pages, harvest links, extract every detail page.
    pub async fn crawl(&self) -> CrawlOutcome {
        let started = Instant::now();

        let page_count = self.discover_page_count().await;
        let links = self.harvest_links(page_count).await;

        info!(links = links.len(), "Extracting detail pages");
        let details: Vec<_> = links.iter().map(|url| self.extract_detail(url)).collect();
        let entries: Vec<Option<CatalogEntry>> = stream::iter(details)
            .buffered(self.pool.size().max(1))
            .collect()
            .await;

        let mut catalog = Catalog::new();
        let mut skipped = 0;
        for entry in entries {
            match entry.map(|e| catalog.insert(e)) {
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!(error = %e, "Dropping invalid entry");
                    skipped += 1;
                }
                None => skipped += 1,
            }
        }

        let report = CrawlReport {
            pages: page_count,
            links: links.len(),
            entries: catalog.len(),
            skipped,
            duration_ms: started.elapsed().as_millis() as u64,
        };
        info!(
            pages = report.pages,
            links = report.links,
            entries = report.entries,
            skipped = report.skipped,
            "Crawl finished"
        );

        CrawlOutcome { catalog, report }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fixtures, ScriptedRenderer};

    const BASE: &str = "https://shop.test";

    fn config() -> CrawlerConfig {
        CrawlerConfig {
            page_url_template: format!("{}/yarn/page/{{page}}", BASE),
            max_pages: 10,
            request_timeout_secs: 2,
            ..CrawlerConfig::default()
        }
    }

    fn page_url(n: u32) -> String {
        format!("{}/yarn/page/{}", BASE, n)
    }

    fn crawler(renderer: ScriptedRenderer) -> CatalogCrawler<ScriptedRenderer> {
        CatalogCrawler::new(config(), RendererPool::single(renderer)).unwrap()
    }

    #[tokio::test]
    async fn test_discover_stops_at_first_empty_page() {
        let renderer = ScriptedRenderer::new()
            .with_page(&page_url(1), fixtures::listing_page(&[("Red", "/yarn/red")]))
            .with_page(&page_url(2), fixtures::listing_page(&[("Blue", "/yarn/blue")]))
            .with_page(&page_url(3), fixtures::listing_page(&[]))
            .with_page(&page_url(4), fixtures::listing_page(&[("Late", "/yarn/late")]));
        let log = renderer.navigation_log();

        assert_eq!(crawler(renderer).discover_page_count().await, 2);
        assert_eq!(log.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_discover_treats_render_failure_as_empty() {
        let renderer = ScriptedRenderer::new()
            .with_page(&page_url(1), fixtures::listing_page(&[("Red", "/yarn/red")]))
            .with_failure(&page_url(2), 503);

        assert_eq!(crawler(renderer).discover_page_count().await, 1);
    }

    #[tokio::test]
    async fn test_discover_missing_container_counts_as_empty() {
        let renderer = ScriptedRenderer::new()
            .with_page(&page_url(1), fixtures::listing_page(&[("Red", "/yarn/red")]))
            .with_page(&page_url(2), "<html><body><p>Sold out</p></body></html>");

        assert_eq!(crawler(renderer).discover_page_count().await, 1);
    }

    #[tokio::test]
    async fn test_discover_returns_at_least_one() {
        let renderer = ScriptedRenderer::new();
        assert_eq!(crawler(renderer).discover_page_count().await, 1);
    }

    #[tokio::test]
    async fn test_discover_respects_page_cap() {
        let mut renderer = ScriptedRenderer::new();
        for n in 1..=20 {
            renderer = renderer.with_page(&page_url(n), fixtures::listing_page(&[("Red", "/yarn/red")]));
        }
        let log = renderer.navigation_log();

        let crawler = CatalogCrawler::new(
            CrawlerConfig {
                max_pages: 5,
                ..config()
            },
            RendererPool::single(renderer),
        )
        .unwrap();

        assert_eq!(crawler.discover_page_count().await, 5);
        assert_eq!(log.lock().unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_discover_times_out_slow_pages() {
        let renderer = ScriptedRenderer::new()
            .with_page(&page_url(1), fixtures::listing_page(&[("Red", "/yarn/red")]))
            .with_page(&page_url(2), fixtures::listing_page(&[("Blue", "/yarn/blue")]))
            .with_delay(&page_url(2), Duration::from_secs(5));

        let crawler = CatalogCrawler::new(
            CrawlerConfig {
                request_timeout_secs: 1,
                ..config()
            },
            RendererPool::single(renderer),
        )
        .unwrap();

        assert_eq!(crawler.discover_page_count().await, 1);
    }

    #[tokio::test]
    async fn test_harvest_filters_lots_and_keeps_order() {
        let renderer = ScriptedRenderer::new()
            .with_page(
                &page_url(1),
                fixtures::listing_page(&[
                    ("Merino Teal", "/yarn/merino-teal"),
                    ("Mixed Lot", "/yarn/mixed-lot"),
                    ("Cotton Ochre", "https://shop.test/yarn/cotton-ochre"),
                ]),
            )
            .with_page(
                &page_url(2),
                fixtures::listing_page(&[
                    ("Needle Set", "/yarn/needles"),
                    ("Merino Teal", "/yarn/merino-teal"),
                ]),
            );

        let links = crawler(renderer).harvest_links(2).await;
        assert_eq!(
            links,
            vec![
                "https://shop.test/yarn/merino-teal".to_string(),
                "https://shop.test/yarn/cotton-ochre".to_string(),
                "https://shop.test/yarn/merino-teal".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_harvest_skips_broken_pages() {
        let renderer = ScriptedRenderer::new()
            .with_failure(&page_url(1), 500)
            .with_page(&page_url(2), "<html><body>no container</body></html>")
            .with_page(&page_url(3), fixtures::listing_page(&[("Red", "/yarn/red")]));

        let links = crawler(renderer).harvest_links(3).await;
        assert_eq!(links, vec!["https://shop.test/yarn/red".to_string()]);
    }

    #[tokio::test]
    async fn test_harvest_parallel_sessions_keep_page_order() {
        let mut sessions = Vec::new();
        for _ in 0..3 {
            let mut renderer = ScriptedRenderer::new();
            for n in 1..=6u32 {
                let title = format!("Color {n}");
                let href = format!("/yarn/{n}");
                renderer = renderer
                    .with_page(
                        &page_url(n),
                        fixtures::listing_page(&[(title.as_str(), href.as_str())]),
                    )
                    .with_delay(&page_url(n), Duration::from_millis(u64::from(7 - n) * 5));
            }
            sessions.push(renderer);
        }
        let crawler = CatalogCrawler::new(config(), RendererPool::new(sessions)).unwrap();

        let links = crawler.harvest_links(6).await;
        let expected: Vec<String> = (1..=6).map(|n| format!("https://shop.test/yarn/{n}")).collect();
        assert_eq!(links, expected);
    }

    #[tokio::test]
    async fn test_extract_detail_success() {
        let url = "https://shop.test/yarn/merino-teal";
        let renderer = ScriptedRenderer::new().with_page(
            url,
            fixtures::detail_page("Merino Teal", Some("/img/merino-teal.jpg")),
        );

        let entry = crawler(renderer).extract_detail(url).await.unwrap();
        assert_eq!(entry.url, url);
        assert_eq!(entry.name, "Merino Teal");
        assert_eq!(
            entry.image_url.as_deref(),
            Some("https://shop.test/img/merino-teal.jpg")
        );
    }

    #[tokio::test]
    async fn test_extract_detail_lot_title_yields_nothing() {
        let url = "https://shop.test/yarn/lot";
        let renderer = ScriptedRenderer::new()
            .with_page(url, fixtures::detail_page("Mixed Lot", Some("/img/lot.jpg")));
        assert!(crawler(renderer).extract_detail(url).await.is_none());
    }

    #[tokio::test]
    async fn test_extract_detail_missing_elements_yield_nothing() {
        let no_image = "https://shop.test/yarn/no-image";
        let no_page = "https://shop.test/yarn/gone";
        let renderer = ScriptedRenderer::new()
            .with_page(no_image, fixtures::detail_page_without_image("Lonely"))
            .with_failure(no_page, 404);
        let crawler = crawler(renderer);

        assert!(crawler.extract_detail(no_image).await.is_none());
        assert!(crawler.extract_detail(no_page).await.is_none());
    }

    #[tokio::test]
    async fn test_extract_detail_image_without_src() {
        let url = "https://shop.test/yarn/blank";
        let renderer = ScriptedRenderer::new().with_page(url, fixtures::detail_page("Blank", None));

        let entry = crawler(renderer).extract_detail(url).await.unwrap();
        assert_eq!(entry.image_url, None);
    }

    #[tokio::test]
    async fn test_crawl_builds_catalog_and_continues_past_failures() {
        let renderer = ScriptedRenderer::new()
            .with_page(
                &page_url(1),
                fixtures::listing_page(&[
                    ("Merino Teal", "/yarn/merino-teal"),
                    ("Broken", "/yarn/broken"),
                    ("Hook 5mm", "/yarn/hook"),
                ]),
            )
            .with_page(&page_url(2), fixtures::listing_page(&[("Cotton Ochre", "/yarn/cotton-ochre")]))
            .with_page(&page_url(3), fixtures::listing_page(&[]))
            .with_page(
                "https://shop.test/yarn/merino-teal",
                fixtures::detail_page("Merino Teal", Some("/img/teal.jpg")),
            )
            .with_failure("https://shop.test/yarn/broken", 500)
            .with_page(
                "https://shop.test/yarn/cotton-ochre",
                fixtures::detail_page("Cotton Ochre", Some("/img/ochre.jpg")),
            );

        let outcome = crawler(renderer).crawl().await;
        let names: Vec<&str> = outcome.catalog.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Merino Teal", "Cotton Ochre"]);
        assert_eq!(outcome.report.pages, 2);
        assert_eq!(outcome.report.links, 3);
        assert_eq!(outcome.report.entries, 2);
        assert_eq!(outcome.report.skipped, 1);
    }

    #[test]
    fn test_invalid_selector_rejected() {
        let result = CatalogCrawler::new(
            CrawlerConfig {
                image_selector: "img[".to_string(),
                ..config()
            },
            RendererPool::single(ScriptedRenderer::new()),
        );
        assert!(matches!(result, Err(CrawlError::InvalidSelector { .. })));
    }
}
