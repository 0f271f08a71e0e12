//! Catalog API handlers.

use std::sync::Arc;

use axum::{extract::State, Json};
use serde::Serialize;
use yarnhue_core::{CatalogEntry, CatalogStats, CrawlReport, InvalidationReport};

use super::error::ApiError;
use crate::state::AppState;

// ============================================================================
// Response types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct CatalogResponse {
    /// Listings in crawl order.
    pub entries: Vec<CatalogEntry>,
    pub stats: CatalogStats,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/v1/catalog/rebuild
///
/// Crawl the shop and replace the cached catalog.
pub async fn rebuild_catalog(
    State(state): State<Arc<AppState>>,
) -> Result<Json<CrawlReport>, ApiError> {
    let report = state.matcher().rebuild_catalog().await?;
    Ok(Json(report))
}

/// GET /api/v1/catalog
///
/// The cached catalog; 404 until a crawl has run.
pub async fn get_catalog(
    State(state): State<Arc<AppState>>,
) -> Result<Json<CatalogResponse>, ApiError> {
    let catalog = state.matcher().catalog().await?;
    let stats = CatalogStats::from(&catalog);
    Ok(Json(CatalogResponse {
        entries: catalog.iter().cloned().collect(),
        stats,
    }))
}

/// DELETE /api/v1/cache
///
/// Drop the cached catalog, cached photos and the last ranking.
pub async fn clear_cache(
    State(state): State<Arc<AppState>>,
) -> Result<Json<InvalidationReport>, ApiError> {
    let report = state.matcher().clear_cache().await?;
    Ok(Json(report))
}
