//! Similarity ranker implementation.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::catalog::Catalog;
use crate::color::{distance, ColorError, DominantColorExtractor, RgbColor};
use crate::config::RankingConfig;
use crate::fetcher::{FetchError, ImageFetcher};

use super::types::{RankError, SimilarityResult};

/// A downloaded photo that is deleted when dropped.
struct WorkingFile(PathBuf);

impl Drop for WorkingFile {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.0) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => debug!(path = %self.0.display(), error = %e, "Could not remove working image"),
        }
    }
}

/// Scores catalog entries against a reference color.
pub struct SimilarityRanker {
    fetcher: Arc<dyn ImageFetcher>,
    max_concurrent: usize,
    fetch_timeout: Duration,
}

impl SimilarityRanker {
    /// Creates a ranker that keeps at most `max_concurrent` downloads in flight.
    pub fn new(fetcher: Arc<dyn ImageFetcher>, max_concurrent: usize, fetch_timeout: Duration) -> Self {
        Self {
            fetcher,
            max_concurrent: max_concurrent.max(1),
            fetch_timeout,
        }
    }

    pub fn from_config(fetcher: Arc<dyn ImageFetcher>, config: &RankingConfig) -> Self {
        Self::new(
            fetcher,
            config.max_concurrent_fetches,
            Duration::from_secs(config.fetch_timeout_secs),
        )
    }

    /// Fetches one photo and reduces it to its dominant color.
    ///
    /// The downloaded file is removed on every exit path, including a
    /// timeout or a cancelled task.
    async fn dominant_color(
        fetcher: Arc<dyn ImageFetcher>,
        image_url: String,
        destination: PathBuf,
        extractor: DominantColorExtractor,
        fetch_timeout: Duration,
    ) -> Result<RgbColor, RankError> {
        let working = WorkingFile(destination);

        match tokio::time::timeout(fetch_timeout, fetcher.fetch(&image_url, &working.0)).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => return Err(e.into()),
            Err(_) => {
                return Err(FetchError::Timeout {
                    url: image_url,
                    timeout_secs: fetch_timeout.as_secs(),
                }
                .into())
            }
        }

        let path = working.0.clone();
        let extracted = tokio::task::spawn_blocking(move || extractor.extract_from_file(&path))
            .await
            .map_err(|e| RankError::Worker(e.to_string()))?;

        Ok(extracted?)
    }

    /// Ranks every entry that has a photo by distance to `reference`.
    ///
    /// Entries whose photo cannot be fetched, decoded, or has no non-white
    /// pixels are excluded. The result is sorted by ascending score; equal
    /// scores keep catalog order. An empty catalog yields an empty list.
    pub async fn rank(
        &self,
        reference: RgbColor,
        catalog: &Catalog,
        image_cache_dir: &Path,
        extractor: DominantColorExtractor,
    ) -> Vec<SimilarityResult> {
        let started = Instant::now();
        let entries: Vec<_> = catalog.iter().collect();
        let semaphore = Arc::new(Semaphore::new(self.max_concurrent));
        let mut tasks = JoinSet::new();

        for (index, entry) in entries.iter().enumerate() {
            let Some(image_url) = entry.image_url.clone() else {
                continue;
            };

            let fetcher = Arc::clone(&self.fetcher);
            let semaphore = Arc::clone(&semaphore);
            let destination = image_cache_dir.join(format!("entry-{}.img", index));
            let fetch_timeout = self.fetch_timeout;

            tasks.spawn(async move {
                let outcome = match semaphore.acquire_owned().await {
                    Ok(_permit) => {
                        Self::dominant_color(fetcher, image_url, destination, extractor, fetch_timeout)
                            .await
                    }
                    Err(e) => Err(RankError::Worker(e.to_string())),
                };
                (index, outcome)
            });
        }

        let considered = tasks.len();
        let mut colors: Vec<Option<RgbColor>> = vec![None; entries.len()];

        while let Some(joined) = tasks.join_next().await {
            let (index, outcome) = match joined {
                Ok(done) => done,
                Err(e) => {
                    warn!(error = %e, "Ranking worker panicked");
                    continue;
                }
            };

            let entry = entries[index];
            match outcome {
                Ok(color) => {
                    debug!(link = %entry.url, color = %color, "Dominant color extracted");
                    colors[index] = Some(color);
                }
                Err(RankError::Color(ColorError::NoDominantColor)) => {
                    debug!(link = %entry.url, "No dominant color, every pixel is white-like");
                }
                Err(e) => {
                    warn!(link = %entry.url, error = %e, "Excluding entry from ranking");
                }
            }
        }

        let mut results: Vec<SimilarityResult> = entries
            .iter()
            .zip(colors)
            .filter_map(|(entry, color)| {
                let color = color?;
                Some(SimilarityResult {
                    title: entry.name.clone(),
                    link: entry.url.clone(),
                    image_url: entry.image_url.clone()?,
                    color,
                    score: distance(reference, color),
                })
            })
            .collect();

        // Stable: equal scores keep catalog order.
        results.sort_by(|a, b| a.score.total_cmp(&b.score));

        info!(
            reference = %reference,
            considered = considered,
            ranked = results.len(),
            excluded = considered - results.len(),
            duration_ms = started.elapsed().as_millis() as u64,
            "Ranking finished"
        );

        results
    }
}
