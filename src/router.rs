use std::sync::Arc;

use axum::routing::{get, post};
use axum::{Router, middleware};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth::require_api_key;
use crate::handlers::{
    chat_completions_handler, embeddings_handler, get_model_handler, health_handler,
    image_generations_handler, list_models_handler, metrics_handler, speech_handler,
};
use crate::metrics::track_requests;
use crate::state::AppState;

pub fn build(state: Arc<AppState>) -> Router {
    let v1 = Router::new()
        .route("/models", get(list_models_handler))
        .route("/models/{id}", get(get_model_handler))
        .route("/chat/completions", post(chat_completions_handler))
        .route("/embeddings", post(embeddings_handler))
        .route("/images/generations", post(image_generations_handler))
        .route("/audio/speech", post(speech_handler))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_api_key));

    Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .nest("/v1", v1)
        .layer(middleware::from_fn_with_state(
            state.metrics.clone(),
            track_requests,
        ))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
