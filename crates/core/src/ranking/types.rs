//! Types for similarity ranking.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::color::{ColorError, RgbColor};
use crate::fetcher::FetchError;

/// One ranked listing. Lower score means closer to the reference color.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarityResult {
    /// Listing display name.
    pub title: String,
    /// Detail-page URL (catalog key).
    pub link: String,
    /// Photo URL the color was taken from.
    pub image_url: String,
    /// Dominant color of the photo.
    pub color: RgbColor,
    /// Euclidean RGB distance to the reference color.
    pub score: f64,
}

/// Why an entry was left out of a ranking.
#[derive(Debug, Error)]
pub enum RankError {
    #[error("Image fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Color(#[from] ColorError),

    #[error("Ranking worker failed: {0}")]
    Worker(String),
}
