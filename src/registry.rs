use serde::{Deserialize, Serialize};

// which endpoint a model is served on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    Chat,
    Embedding,
    Image,
    Speech,
}

impl ModelKind {
    pub fn endpoint(&self) -> &'static str {
        match self {
            ModelKind::Chat => "/v1/chat/completions",
            ModelKind::Embedding => "/v1/embeddings",
            ModelKind::Image => "/v1/images/generations",
            ModelKind::Speech => "/v1/audio/speech",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelSpec {
    pub id: String,
    pub kind: ModelKind,

    #[serde(default = "default_owner")]
    pub owned_by: String,

    #[serde(default)]
    pub created: i64,

    // chat: ceiling on max_tokens
    #[serde(default)]
    pub max_output_tokens: Option<u32>,

    // embedding: native vector size
    #[serde(default)]
    pub dimensions: Option<usize>,

    // image: accepted sizes and per-request image limit
    #[serde(default)]
    pub image_sizes: Vec<String>,
    #[serde(default)]
    pub max_images: Option<u32>,
}

fn default_owner() -> String {
    "openai-mock".to_string()
}

impl ModelSpec {
    fn chat(id: &str, max_output_tokens: u32) -> Self {
        Self {
            id: id.to_string(),
            kind: ModelKind::Chat,
            owned_by: "openai".to_string(),
            created: 1_715_367_049,
            max_output_tokens: Some(max_output_tokens),
            dimensions: None,
            image_sizes: Vec::new(),
            max_images: None,
        }
    }

    fn embedding(id: &str, dimensions: usize) -> Self {
        Self {
            kind: ModelKind::Embedding,
            max_output_tokens: None,
            dimensions: Some(dimensions),
            ..Self::chat(id, 0)
        }
    }

    fn image(id: &str, sizes: &[&str], max_images: u32) -> Self {
        Self {
            kind: ModelKind::Image,
            max_output_tokens: None,
            image_sizes: sizes.iter().map(|s| s.to_string()).collect(),
            max_images: Some(max_images),
            ..Self::chat(id, 0)
        }
    }

    fn speech(id: &str) -> Self {
        Self {
            kind: ModelKind::Speech,
            max_output_tokens: None,
            ..Self::chat(id, 0)
        }
    }
}

// Configured models, in listing order
#[derive(Debug, Clone)]
pub struct ModelRegistry {
    models: Vec<ModelSpec>,
}

impl ModelRegistry {
    pub fn new(models: Vec<ModelSpec>) -> Self {
        Self { models }
    }

    pub fn builtin_models() -> Vec<ModelSpec> {
        vec![
            ModelSpec::chat("gpt-4o", 16_384),
            ModelSpec::chat("gpt-4o-mini", 16_384),
            ModelSpec::chat("gpt-4-turbo", 4_096),
            ModelSpec::chat("gpt-3.5-turbo", 4_096),
            ModelSpec::embedding("text-embedding-3-small", 1_536),
            ModelSpec::embedding("text-embedding-3-large", 3_072),
            ModelSpec::embedding("text-embedding-ada-002", 1_536),
            ModelSpec::image("dall-e-2", &["256x256", "512x512", "1024x1024"], 10),
            ModelSpec::image("dall-e-3", &["1024x1024", "1792x1024", "1024x1792"], 1),
            ModelSpec::speech("tts-1"),
            ModelSpec::speech("tts-1-hd"),
        ]
    }

    pub fn get(&self, id: &str) -> Option<&ModelSpec> {
        self.models.iter().find(|m| m.id == id)
    }

    // lookup restricted to the models an endpoint serves
    pub fn find(&self, kind: ModelKind, id: &str) -> Option<&ModelSpec> {
        self.get(id).filter(|m| m.kind == kind)
    }

    pub fn all(&self) -> &[ModelSpec] {
        &self.models
    }
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::new(Self::builtin_models())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_respects_kind() {
        let registry = ModelRegistry::default();
        assert!(registry.find(ModelKind::Chat, "gpt-4o").is_some());
        assert!(registry.find(ModelKind::Embedding, "gpt-4o").is_none());
        assert!(registry.find(ModelKind::Image, "dall-e-3").is_some());
        assert!(registry.find(ModelKind::Speech, "tts-1").is_some());
        assert!(registry.find(ModelKind::Speech, "dall-e-3").is_none());
        assert!(registry.find(ModelKind::Chat, "no-such-model").is_none());
    }

    #[test]
    fn test_builtin_ceilings() {
        let registry = ModelRegistry::default();
        assert_eq!(registry.get("gpt-3.5-turbo").unwrap().max_output_tokens, Some(4096));
        assert_eq!(
            registry.get("text-embedding-3-large").unwrap().dimensions,
            Some(3072)
        );
        assert_eq!(registry.get("dall-e-3").unwrap().max_images, Some(1));
    }

    #[test]
    fn test_model_deserialize_defaults() {
        let spec: ModelSpec = toml::from_str(
            r#"
            id = "local-chat"
            kind = "chat"
            max_output_tokens = 128
        "#,
        )
        .unwrap();
        assert_eq!(spec.kind, ModelKind::Chat);
        assert_eq!(spec.owned_by, "openai-mock");
        assert!(spec.image_sizes.is_empty());
    }
}
