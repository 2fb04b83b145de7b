use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};

use crate::error::ApiError;
use crate::models::{ModelList, ModelObject};
use crate::state::AppState;

pub async fn list_models_handler(State(state): State<Arc<AppState>>) -> Json<ModelList> {
    Json(ModelList {
        object: "list",
        data: state.registry.all().iter().map(ModelObject::from).collect(),
    })
}

pub async fn get_model_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ModelObject>, ApiError> {
    state
        .registry
        .get(&id)
        .map(|spec| Json(ModelObject::from(spec)))
        .ok_or_else(|| ApiError::NotFound(format!("The model '{id}' does not exist")))
}
