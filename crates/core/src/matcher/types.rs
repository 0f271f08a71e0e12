//! Types for the matcher service.

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::catalog::CatalogError;
use crate::color::{ColorError, RgbColor};
use crate::crawler::CrawlError;
use crate::fetcher::FetchError;
use crate::ranking::SimilarityResult;
use crate::reference::ReferenceError;
use crate::renderer::RenderError;

/// A finished ranking, kept so the display layer can page over it without
/// re-running the pipeline.
#[derive(Debug, Clone, Serialize)]
pub struct RankingSnapshot {
    /// Reference color the results were scored against.
    pub reference: RgbColor,
    /// White threshold in effect for the run.
    pub white_threshold: u8,
    /// Catalog entries that carried a photo URL.
    pub considered: usize,
    /// Ranked results, closest first.
    pub results: Vec<SimilarityResult>,
    pub ranked_at: DateTime<Utc>,
    pub duration_ms: u64,
}

impl RankingSnapshot {
    /// Entries with a photo that were left out of the results.
    pub fn excluded(&self) -> usize {
        self.considered.saturating_sub(self.results.len())
    }
}

/// Errors from matcher operations.
#[derive(Debug, Error)]
pub enum MatcherError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Reference(#[from] ReferenceError),

    #[error(transparent)]
    Color(#[from] ColorError),

    #[error("No ranking available; run a ranking first")]
    NoRanking,

    #[error("Failed to build crawler: {0}")]
    Crawler(#[from] CrawlError),

    #[error("Failed to build render session: {0}")]
    Renderer(#[from] RenderError),

    #[error("Failed to build image fetcher: {0}")]
    Fetcher(#[from] FetchError),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Background task failed: {0}")]
    Task(String),
}

impl MatcherError {
    /// Whether the error means "nothing there yet" rather than a fault.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::Catalog(CatalogError::NotFound) | Self::Reference(ReferenceError::NotFound) | Self::NoRanking
        )
    }
}
