use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::{catalog, handlers, rankings, reference};
use crate::state::AppState;

/// Upper bound on an uploaded reference photo.
const MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

pub fn create_router(state: Arc<AppState>) -> Router {
    let api_routes = Router::new()
        // Health and config
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        // Catalog and cache
        .route("/catalog", get(catalog::get_catalog))
        .route("/catalog/rebuild", post(catalog::rebuild_catalog))
        .route("/cache", delete(catalog::clear_cache))
        // Reference photo
        .route(
            "/reference",
            put(reference::upload_reference).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/reference/color", get(reference::get_reference_color))
        // Ranking
        .route(
            "/threshold",
            get(rankings::get_threshold).put(rankings::set_threshold),
        )
        .route(
            "/rankings",
            post(rankings::run_ranking).get(rankings::get_ranking_page),
        )
        .with_state(state);

    Router::new()
        .nest("/api/v1", api_routes)
        .layer(TraceLayer::new_for_http())
}
