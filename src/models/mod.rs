// OpenAI wire formats
pub mod audio;
pub mod chat;
pub mod embeddings;
pub mod images;

use serde::Serialize;

use crate::registry::ModelSpec;

// GET /v1/models entries
#[derive(Debug, Clone, Serialize)]
pub struct ModelObject {
    pub id: String,
    pub object: &'static str,
    pub created: i64,
    pub owned_by: String,
}

impl From<&ModelSpec> for ModelObject {
    fn from(spec: &ModelSpec) -> Self {
        Self {
            id: spec.id.clone(),
            object: "model",
            created: spec.created,
            owned_by: spec.owned_by.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ModelList {
    pub object: &'static str,
    pub data: Vec<ModelObject>,
}
