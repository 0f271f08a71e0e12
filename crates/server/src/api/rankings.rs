//! Ranking and threshold API handlers.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use yarnhue_core::{Page, RankingSnapshot, RgbColor, SimilarityResult};

use super::error::ApiError;
use crate::state::AppState;

// ============================================================================
// Request/Response types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct RankingPageParams {
    #[serde(default)]
    pub offset: usize,
    #[serde(default)]
    pub page_size: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct RankingResponse {
    pub reference: RgbColor,
    pub white_threshold: u8,
    pub considered: usize,
    pub excluded: usize,
    pub ranked_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub page: Page<SimilarityResult>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ThresholdBody {
    pub white_threshold: i64,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/v1/rankings
///
/// Rank the cached catalog against the reference photo and return the
/// first page. The full ranking is kept for GET /rankings.
pub async fn run_ranking(
    State(state): State<Arc<AppState>>,
) -> Result<Json<RankingResponse>, ApiError> {
    let matcher = state.matcher();
    let snapshot: Arc<RankingSnapshot> = matcher.rank().await?;
    let page = matcher.ranking_page(0, None).await?;

    Ok(Json(RankingResponse {
        reference: snapshot.reference,
        white_threshold: snapshot.white_threshold,
        considered: snapshot.considered,
        excluded: snapshot.excluded(),
        ranked_at: snapshot.ranked_at,
        duration_ms: snapshot.duration_ms,
        page,
    }))
}

/// GET /api/v1/rankings?offset=&page_size=
///
/// Page over the last ranking without re-running it.
pub async fn get_ranking_page(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RankingPageParams>,
) -> Result<Json<Page<SimilarityResult>>, ApiError> {
    if params.page_size == Some(0) {
        return Err(ApiError::bad_request("page_size must be at least 1"));
    }
    let page = state
        .matcher()
        .ranking_page(params.offset, params.page_size)
        .await?;
    Ok(Json(page))
}

/// GET /api/v1/threshold
pub async fn get_threshold(State(state): State<Arc<AppState>>) -> Json<ThresholdBody> {
    Json(ThresholdBody {
        white_threshold: i64::from(state.matcher().white_threshold().await),
    })
}

/// PUT /api/v1/threshold
///
/// 400 when the value is outside 0..=255; the old value is kept.
pub async fn set_threshold(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ThresholdBody>,
) -> Result<Json<ThresholdBody>, ApiError> {
    let threshold = state
        .matcher()
        .set_white_threshold(body.white_threshold)
        .await?;
    Ok(Json(ThresholdBody {
        white_threshold: i64::from(threshold),
    }))
}
