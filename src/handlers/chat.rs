use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::response::{IntoResponse, Response};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::info;

use super::body_error;
use crate::chat::{responder, stream, validation};
use crate::error::ApiError;
use crate::models::chat::ChatCompletionRequest;
use crate::sse::sse_response;
use crate::state::AppState;

// chunks buffered between the stream driver and the transport
const STREAM_BUFFER: usize = 16;

pub async fn chat_completions_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ChatCompletionRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(raw) = payload.map_err(body_error)?;
    let request = validation::validate(raw, &state.registry)?;
    info!(
        model = %request.model,
        n = request.n,
        stream = request.stream,
        temperature = request.temperature,
        top_p = request.top_p,
        "chat completion request"
    );

    let mut rng = StdRng::from_entropy();

    if request.stream {
        let chunks = stream::prepare(&request, state.generator.as_ref(), &mut rng).await?;
        let (tx, rx) = mpsc::channel(STREAM_BUFFER);
        tokio::spawn(stream::drive(chunks, tx));
        return Ok(sse_response(ReceiverStream::new(rx)).into_response());
    }

    let completion = responder::respond(&request, state.generator.as_ref(), &mut rng).await?;
    Ok(Json(completion).into_response())
}
