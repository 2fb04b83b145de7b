use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use futures::future::try_join_all;

use crate::error::ApiError;
use crate::generator::ContentGenerator;
use crate::models::embeddings::{
    EmbeddingData, EmbeddingRequest, EmbeddingResponse, EmbeddingUsage, EmbeddingVector,
};
use crate::registry::{ModelKind, ModelRegistry};

const FALLBACK_DIMENSIONS: usize = 1536;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Encoding {
    Float,
    Base64,
}

// Validate, embed every input concurrently, and shape the list response.
pub async fn respond(
    raw: EmbeddingRequest,
    registry: &ModelRegistry,
    generator: &dyn ContentGenerator,
) -> Result<EmbeddingResponse, ApiError> {
    let model = registry.find(ModelKind::Embedding, &raw.model).ok_or_else(|| {
        ApiError::Validation(format!(
            "Invalid 'model': the model '{}' does not exist or is not supported by {}.",
            raw.model,
            ModelKind::Embedding.endpoint()
        ))
    })?;

    let inputs = raw.input.into_vec();
    if inputs.is_empty() || inputs.iter().any(|s| s.is_empty()) {
        return Err(ApiError::Validation(
            "Invalid 'input': expected a non-empty string or a non-empty array of non-empty strings."
                .to_string(),
        ));
    }

    let native = model.dimensions.unwrap_or(FALLBACK_DIMENSIONS);
    let dimensions = match raw.dimensions {
        None => native,
        Some(d) if (1..=native).contains(&d) => d,
        Some(d) => {
            return Err(ApiError::Validation(format!(
                "Invalid 'dimensions': {d}. The model '{}' supports between 1 and {native} dimensions.",
                model.id
            )));
        }
    };

    let encoding = match raw.encoding_format.as_deref() {
        None | Some("float") => Encoding::Float,
        Some("base64") => Encoding::Base64,
        Some(other) => {
            return Err(ApiError::Validation(format!(
                "Invalid 'encoding_format': '{other}'. Expected 'float' or 'base64'."
            )));
        }
    };

    let vectors = try_join_all(inputs.iter().map(|i| generator.embedding(i, dimensions))).await?;
    let prompt_tokens = inputs.iter().map(|i| i.chars().count()).sum();

    let data = vectors
        .into_iter()
        .enumerate()
        .map(|(index, vector)| EmbeddingData {
            object: "embedding",
            index,
            embedding: encode(vector, encoding),
        })
        .collect();

    Ok(EmbeddingResponse {
        object: "list",
        data,
        model: model.id.clone(),
        usage: EmbeddingUsage {
            prompt_tokens,
            total_tokens: prompt_tokens,
        },
    })
}

fn encode(vector: Vec<f32>, encoding: Encoding) -> EmbeddingVector {
    match encoding {
        Encoding::Float => EmbeddingVector::Float(vector),
        Encoding::Base64 => {
            let bytes: Vec<u8> = vector.iter().flat_map(|v| v.to_le_bytes()).collect();
            EmbeddingVector::Base64(STANDARD.encode(bytes))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::MockGenerator;
    use crate::models::embeddings::EmbeddingInput;

    fn request(input: EmbeddingInput) -> EmbeddingRequest {
        EmbeddingRequest {
            model: "text-embedding-3-small".into(),
            input,
            encoding_format: None,
            dimensions: None,
        }
    }

    #[tokio::test]
    async fn test_embeds_every_input() {
        let raw = request(EmbeddingInput::Multiple(vec!["one".into(), "three".into()]));
        let response = respond(raw, &ModelRegistry::default(), &MockGenerator::new())
            .await
            .unwrap();
        assert_eq!(response.object, "list");
        assert_eq!(response.data.len(), 2);
        assert_eq!(response.data[1].index, 1);
        assert_eq!(response.usage.prompt_tokens, 8);
        match &response.data[0].embedding {
            EmbeddingVector::Float(v) => assert_eq!(v.len(), 1536),
            other => panic!("expected floats, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_dimensions_and_base64() {
        let mut raw = request(EmbeddingInput::Single("hello".into()));
        raw.dimensions = Some(4);
        raw.encoding_format = Some("base64".into());
        let response = respond(raw, &ModelRegistry::default(), &MockGenerator::new())
            .await
            .unwrap();
        match &response.data[0].embedding {
            EmbeddingVector::Base64(s) => assert_eq!(STANDARD.decode(s).unwrap().len(), 16),
            other => panic!("expected base64, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_rejections() {
        let registry = ModelRegistry::default();
        let generator = MockGenerator::new();

        let mut raw = request(EmbeddingInput::Single("x".into()));
        raw.model = "gpt-4o".into();
        assert!(matches!(respond(raw, &registry, &generator).await, Err(ApiError::Validation(_))));

        let raw = request(EmbeddingInput::Multiple(vec![]));
        assert!(matches!(respond(raw, &registry, &generator).await, Err(ApiError::Validation(_))));

        let mut raw = request(EmbeddingInput::Single("x".into()));
        raw.dimensions = Some(5000);
        assert!(matches!(respond(raw, &registry, &generator).await, Err(ApiError::Validation(_))));

        let mut raw = request(EmbeddingInput::Single("x".into()));
        raw.encoding_format = Some("hex".into());
        assert!(matches!(respond(raw, &registry, &generator).await, Err(ApiError::Validation(_))));
    }
}
