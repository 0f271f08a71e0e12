//! Reference photo API handlers.

use std::sync::Arc;

use axum::{
    extract::{Multipart, State},
    Json,
};
use serde::Serialize;
use tracing::debug;
use yarnhue_core::RgbColor;

use super::error::ApiError;
use crate::state::AppState;

/// Multipart field carrying the photo.
const IMAGE_FIELD: &str = "image";

#[derive(Debug, Serialize)]
pub struct ReferenceResponse {
    /// Dominant color under the current threshold; absent when every pixel
    /// is white-like.
    pub color: Option<RgbColor>,
    pub hex: Option<String>,
}

impl From<Option<RgbColor>> for ReferenceResponse {
    fn from(color: Option<RgbColor>) -> Self {
        Self {
            color,
            hex: color.map(|c| c.to_string()),
        }
    }
}

/// PUT /api/v1/reference
///
/// Replace the reference photo with the multipart `image` field.
pub async fn upload_reference(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<ReferenceResponse>, ApiError> {
    let mut image: Option<Vec<u8>> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Malformed multipart body: {}", e)))?
    {
        if field.name() != Some(IMAGE_FIELD) {
            debug!(field = ?field.name(), "Ignoring multipart field");
            continue;
        }
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::bad_request(format!("Failed to read image: {}", e)))?;
        image = Some(bytes.to_vec());
    }

    let image = match image {
        Some(bytes) if !bytes.is_empty() => bytes,
        _ => {
            return Err(ApiError::bad_request(format!(
                "Missing '{}' field",
                IMAGE_FIELD
            )))
        }
    };

    let color = state.matcher().replace_reference(image).await?;
    Ok(Json(ReferenceResponse::from(color)))
}

/// GET /api/v1/reference/color
///
/// Dominant color of the reference photo; 404 when none was uploaded.
pub async fn get_reference_color(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ReferenceResponse>, ApiError> {
    let color = state.matcher().reference_color().await?;
    Ok(Json(ReferenceResponse::from(Some(color))))
}
