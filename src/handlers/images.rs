use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use tracing::info;

use super::body_error;
use crate::error::ApiError;
use crate::images;
use crate::models::images::{ImageGenerationRequest, ImageGenerationResponse};
use crate::state::AppState;

pub async fn image_generations_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ImageGenerationRequest>, JsonRejection>,
) -> Result<Json<ImageGenerationResponse>, ApiError> {
    let Json(raw) = payload.map_err(body_error)?;
    info!(model = ?raw.model, n = ?raw.n, "image generation request");
    let response = images::respond(raw, &state.registry, state.generator.as_ref()).await?;
    Ok(Json(response))
}
