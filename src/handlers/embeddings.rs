use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use tracing::info;

use super::body_error;
use crate::embeddings;
use crate::error::ApiError;
use crate::models::embeddings::{EmbeddingRequest, EmbeddingResponse};
use crate::state::AppState;

pub async fn embeddings_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<EmbeddingRequest>, JsonRejection>,
) -> Result<Json<EmbeddingResponse>, ApiError> {
    let Json(raw) = payload.map_err(body_error)?;
    info!(model = %raw.model, "embeddings request");
    let response = embeddings::respond(raw, &state.registry, state.generator.as_ref()).await?;
    Ok(Json(response))
}
