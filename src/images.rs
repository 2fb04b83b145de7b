use chrono::Utc;
use futures::future::try_join_all;

use crate::error::ApiError;
use crate::generator::ContentGenerator;
use crate::models::images::{ImageFormat, ImageGenerationRequest, ImageGenerationResponse};
use crate::registry::{ModelKind, ModelRegistry};

const DEFAULT_MODEL: &str = "dall-e-2";
const DEFAULT_SIZE: &str = "1024x1024";
const MAX_IMAGES: u32 = 10;

// All images are generated concurrently; one failure fails the request.
pub async fn respond(
    raw: ImageGenerationRequest,
    registry: &ModelRegistry,
    generator: &dyn ContentGenerator,
) -> Result<ImageGenerationResponse, ApiError> {
    if raw.prompt.trim().is_empty() {
        return Err(ApiError::Validation(
            "Invalid 'prompt': expected a non-empty string.".to_string(),
        ));
    }

    let model_id = raw.model.as_deref().unwrap_or(DEFAULT_MODEL);
    let model = registry.find(ModelKind::Image, model_id).ok_or_else(|| {
        ApiError::Validation(format!(
            "Invalid 'model': the model '{model_id}' does not exist or is not supported by {}.",
            ModelKind::Image.endpoint()
        ))
    })?;

    let limit = model.max_images.unwrap_or(MAX_IMAGES);
    let n = raw.n.unwrap_or(1);
    if n < 1 || n > i64::from(limit) {
        return Err(ApiError::Validation(format!(
            "Invalid 'n': {n}. The model '{}' generates between 1 and {limit} images per request.",
            model.id
        )));
    }

    let size = raw.size.as_deref().unwrap_or(DEFAULT_SIZE);
    if !model.image_sizes.is_empty() && !model.image_sizes.iter().any(|s| s == size) {
        return Err(ApiError::Validation(format!(
            "Invalid 'size': '{size}'. Supported sizes for '{}' are {}.",
            model.id,
            model.image_sizes.join(", ")
        )));
    }

    let format = match raw.response_format.as_deref() {
        None | Some("url") => ImageFormat::Url,
        Some("b64_json") => ImageFormat::B64Json,
        Some(other) => {
            return Err(ApiError::Validation(format!(
                "Invalid 'response_format': '{other}'. Expected 'url' or 'b64_json'."
            )));
        }
    };

    let data = try_join_all((0..n).map(|_| generator.image(&raw.prompt, size, format))).await?;

    Ok(ImageGenerationResponse {
        created: Utc::now().timestamp(),
        data,
    })
}
