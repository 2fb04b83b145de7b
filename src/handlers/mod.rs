mod audio;
mod chat;
mod embeddings;
mod health;
mod images;
mod metrics;
mod models;

pub use audio::speech_handler;
pub use chat::chat_completions_handler;
pub use embeddings::embeddings_handler;
pub use health::health_handler;
pub use images::image_generations_handler;
pub use metrics::metrics_handler;
pub use models::{get_model_handler, list_models_handler};

use axum::extract::rejection::JsonRejection;

use crate::error::ApiError;

// malformed bodies are a 400 like any other rejected parameter
fn body_error(rejection: JsonRejection) -> ApiError {
    ApiError::Validation(format!("Invalid request body: {}", rejection.body_text()))
}
