//! Matcher service implementation.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};

use crate::catalog::{Catalog, CatalogStore, InvalidationReport, JsonCatalogStore};
use crate::color::{DominantColorExtractor, RgbColor};
use crate::config::{Config, RankingConfig, StorageConfig};
use crate::crawler::{CatalogCrawler, CatalogSource, CrawlReport};
use crate::fetcher::{HttpImageFetcher, ImageFetcher};
use crate::ranking::{paginate, Page, PageCursor, SimilarityRanker, SimilarityResult};
use crate::reference::ReferenceImage;
use crate::renderer::{HttpRenderer, RendererPool};

use super::types::{MatcherError, RankingSnapshot};

/// Ties crawl, cache, reference photo and ranking together.
///
/// Rebuild, invalidation and ranking are serialized; reads of the cached
/// catalog and of the last ranking are not.
pub struct YarnMatcher {
    source: Arc<dyn CatalogSource>,
    store: Arc<dyn CatalogStore>,
    ranker: SimilarityRanker,
    reference: ReferenceImage,
    image_dir: PathBuf,
    page_size: usize,
    extractor: RwLock<DominantColorExtractor>,
    latest: RwLock<Option<Arc<RankingSnapshot>>>,
    writer: Mutex<()>,
}

impl YarnMatcher {
    /// Create a matcher from its collaborators.
    pub fn new(
        source: Arc<dyn CatalogSource>,
        store: Arc<dyn CatalogStore>,
        fetcher: Arc<dyn ImageFetcher>,
        storage: &StorageConfig,
        ranking: &RankingConfig,
    ) -> Result<Self, MatcherError> {
        let extractor = DominantColorExtractor::new(ranking.white_threshold)?;

        Ok(Self {
            source,
            store,
            ranker: SimilarityRanker::new(
                fetcher,
                ranking.max_concurrent_fetches,
                Duration::from_secs(ranking.fetch_timeout_secs),
            ),
            reference: ReferenceImage::new(storage.reference_path()),
            image_dir: storage.image_dir(),
            page_size: ranking.page_size.max(1),
            extractor: RwLock::new(extractor),
            latest: RwLock::new(None),
            writer: Mutex::new(()),
        })
    }

    /// Create a matcher with HTTP render sessions, an HTTP image fetcher and
    /// a JSON catalog under `storage.data_dir`.
    pub fn from_config(config: &Config) -> Result<Self, MatcherError> {
        let sessions = HttpRenderer::sessions(&config.crawler, config.crawler.sessions)?;
        let crawler = CatalogCrawler::new(config.crawler.clone(), RendererPool::new(sessions))?;
        let store = JsonCatalogStore::new(
            config.storage.catalog_path(),
            config.storage.image_dir(),
        );
        let fetcher = HttpImageFetcher::new(
            &config.crawler.user_agent,
            config.ranking.fetch_timeout_secs,
        )?;

        info!(
            sessions = config.crawler.sessions,
            data_dir = %config.storage.data_dir.display(),
            "Matcher initialized"
        );

        Self::new(
            Arc::new(crawler),
            Arc::new(store),
            Arc::new(fetcher),
            &config.storage,
            &config.ranking,
        )
    }

    /// Default number of results per page.
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn image_dir(&self) -> &Path {
        &self.image_dir
    }

    pub fn reference(&self) -> &ReferenceImage {
        &self.reference
    }

    async fn with_store<T, F>(&self, op: F) -> Result<T, MatcherError>
    where
        T: Send + 'static,
        F: FnOnce(&dyn CatalogStore) -> Result<T, crate::catalog::CatalogError> + Send + 'static,
    {
        let store = Arc::clone(&self.store);
        tokio::task::spawn_blocking(move || op(store.as_ref()))
            .await
            .map_err(|e| MatcherError::Task(e.to_string()))?
            .map_err(MatcherError::from)
    }

    /// Crawls the catalog site and replaces the cached catalog.
    ///
    /// The previous ranking is dropped since it refers to the old catalog.
    pub async fn rebuild_catalog(&self) -> Result<CrawlReport, MatcherError> {
        let _writer = self.writer.lock().await;
        info!("Rebuilding catalog");

        let outcome = self.source.crawl().await;
        let catalog = outcome.catalog;
        self.with_store(move |store| store.save(&catalog)).await?;
        *self.latest.write().await = None;

        info!(
            entries = outcome.report.entries,
            skipped = outcome.report.skipped,
            "Catalog rebuilt"
        );
        Ok(outcome.report)
    }

    /// The cached catalog.
    pub async fn catalog(&self) -> Result<Catalog, MatcherError> {
        self.with_store(|store| store.load()).await
    }

    /// Whether a catalog has been cached.
    pub fn has_catalog(&self) -> bool {
        self.store.exists()
    }

    /// Deletes the cached catalog, every cached image and the last ranking.
    pub async fn clear_cache(&self) -> Result<InvalidationReport, MatcherError> {
        let _writer = self.writer.lock().await;

        let report = self.with_store(|store| store.invalidate()).await?;
        *self.latest.write().await = None;

        if !report.failures.is_empty() {
            warn!(failures = report.failures.len(), "Cache cleared with leftovers");
        }
        Ok(report)
    }

    /// Replaces the reference photo with uploaded bytes.
    pub async fn replace_reference(&self, bytes: Vec<u8>) -> Result<Option<RgbColor>, MatcherError> {
        let extractor = *self.extractor.read().await;
        let reference = self.reference.clone();
        let color = tokio::task::spawn_blocking(move || reference.replace(&bytes, &extractor))
            .await
            .map_err(|e| MatcherError::Task(e.to_string()))??;
        Ok(color)
    }

    /// Replaces the reference photo with a copy of a local file.
    pub async fn replace_reference_from_file(
        &self,
        source: &Path,
    ) -> Result<Option<RgbColor>, MatcherError> {
        let extractor = *self.extractor.read().await;
        let reference = self.reference.clone();
        let source = source.to_path_buf();
        let color = tokio::task::spawn_blocking(move || reference.replace_from_file(&source, &extractor))
            .await
            .map_err(|e| MatcherError::Task(e.to_string()))??;
        Ok(color)
    }

    async fn reference_color_with(
        &self,
        extractor: DominantColorExtractor,
    ) -> Result<RgbColor, MatcherError> {
        let reference = self.reference.clone();
        let color = tokio::task::spawn_blocking(move || reference.color(&extractor))
            .await
            .map_err(|e| MatcherError::Task(e.to_string()))??;
        Ok(color)
    }

    /// Dominant color of the reference photo under the current threshold.
    pub async fn reference_color(&self) -> Result<RgbColor, MatcherError> {
        let extractor = *self.extractor.read().await;
        self.reference_color_with(extractor).await
    }

    pub async fn white_threshold(&self) -> u8 {
        self.extractor.read().await.white_threshold()
    }

    /// Changes the white threshold used by later extractions.
    ///
    /// Values outside 0..=255 are rejected and the current one is kept.
    pub async fn set_white_threshold(&self, threshold: i64) -> Result<u8, MatcherError> {
        let mut extractor = self.extractor.write().await;
        extractor.set_white_threshold(threshold)?;
        info!(threshold = extractor.white_threshold(), "White threshold updated");
        Ok(extractor.white_threshold())
    }

    /// Ranks the cached catalog against the reference photo and keeps the
    /// result for paging.
    pub async fn rank(&self) -> Result<Arc<RankingSnapshot>, MatcherError> {
        let _writer = self.writer.lock().await;
        let started = Instant::now();

        let extractor = *self.extractor.read().await;
        let catalog = self.catalog().await?;
        let reference = self.reference_color_with(extractor).await?;

        tokio::fs::create_dir_all(&self.image_dir)
            .await
            .map_err(|source| MatcherError::Io {
                path: self.image_dir.clone(),
                source,
            })?;

        let results = self
            .ranker
            .rank(reference, &catalog, &self.image_dir, extractor)
            .await;

        let snapshot = Arc::new(RankingSnapshot {
            reference,
            white_threshold: extractor.white_threshold(),
            considered: catalog.with_images().count(),
            results,
            ranked_at: Utc::now(),
            duration_ms: started.elapsed().as_millis() as u64,
        });
        *self.latest.write().await = Some(Arc::clone(&snapshot));

        Ok(snapshot)
    }

    /// The last ranking, if any.
    pub async fn latest_ranking(&self) -> Option<Arc<RankingSnapshot>> {
        self.latest.read().await.clone()
    }

    /// One page of the last ranking. `page_size` defaults to the configured
    /// size; the offset is clamped to the last page.
    pub async fn ranking_page(
        &self,
        offset: usize,
        page_size: Option<usize>,
    ) -> Result<Page<SimilarityResult>, MatcherError> {
        let snapshot = self.latest_ranking().await.ok_or(MatcherError::NoRanking)?;
        let cursor = PageCursor::at(
            offset,
            page_size.unwrap_or(self.page_size),
            snapshot.results.len(),
        );
        Ok(paginate(&snapshot.results, cursor))
    }
}
