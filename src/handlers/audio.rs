use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use tracing::info;

use super::body_error;
use crate::audio;
use crate::error::ApiError;
use crate::models::audio::SpeechRequest;
use crate::state::AppState;

pub async fn speech_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SpeechRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(raw) = payload.map_err(body_error)?;
    info!(model = %raw.model, voice = %raw.voice, "speech request");
    let audio = audio::respond(raw, &state.registry, state.generator.as_ref()).await?;
    Ok(([(header::CONTENT_TYPE, audio.format.content_type())], audio.bytes).into_response())
}
