use tracing::debug;

use crate::error::ApiError;
use crate::generator::ContentGenerator;
use crate::models::audio::{AudioFormat, SpeechAudio, SpeechRequest};
use crate::registry::{ModelKind, ModelRegistry};

pub const MAX_INPUT_CHARS: usize = 4096;
pub const VOICES: [&str; 9] = [
    "alloy", "ash", "coral", "echo", "fable", "onyx", "nova", "sage", "shimmer",
];

const MIN_SPEED: f64 = 0.25;
const MAX_SPEED: f64 = 4.0;

pub async fn respond(
    raw: SpeechRequest,
    registry: &ModelRegistry,
    generator: &dyn ContentGenerator,
) -> Result<SpeechAudio, ApiError> {
    let model = registry.find(ModelKind::Speech, &raw.model).ok_or_else(|| {
        ApiError::Validation(format!(
            "Invalid 'model': the model '{}' does not exist or is not supported by {}.",
            raw.model,
            ModelKind::Speech.endpoint()
        ))
    })?;

    let chars = raw.input.chars().count();
    if raw.input.trim().is_empty() || chars > MAX_INPUT_CHARS {
        return Err(ApiError::Validation(format!(
            "Invalid 'input': expected between 1 and {MAX_INPUT_CHARS} characters, got {chars}."
        )));
    }

    if !VOICES.contains(&raw.voice.as_str()) {
        return Err(ApiError::Validation(format!(
            "Invalid 'voice': '{}'. Expected one of {}.",
            raw.voice,
            VOICES.join(", ")
        )));
    }

    let format = match raw.response_format.as_deref() {
        None => AudioFormat::Mp3,
        Some(name) => AudioFormat::parse(name).ok_or_else(|| {
            ApiError::Validation(format!(
                "Invalid 'response_format': '{name}'. Expected one of {}.",
                AudioFormat::NAMES.join(", ")
            ))
        })?,
    };

    let speed = raw.speed.unwrap_or(1.0);
    if !(MIN_SPEED..=MAX_SPEED).contains(&speed) {
        return Err(ApiError::Validation(format!(
            "Invalid 'speed': {speed}. Expected a value between {MIN_SPEED} and {MAX_SPEED}."
        )));
    }

    let bytes = generator.speech(&raw.input, &raw.voice, format, speed).await?;
    debug!(model = %model.id, bytes = bytes.len(), "speech synthesized");
    Ok(SpeechAudio { format, bytes })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::testing::ScriptedGenerator;
    use crate::generator::MockGenerator;

    fn request() -> SpeechRequest {
        SpeechRequest {
            model: "tts-1".into(),
            input: "The quick brown fox.".into(),
            voice: "alloy".into(),
            response_format: None,
            speed: None,
        }
    }

    fn rejected(raw: SpeechRequest) -> String {
        let registry = ModelRegistry::default();
        let result = futures::executor::block_on(respond(raw, &registry, &MockGenerator::new()));
        match result {
            Err(ApiError::Validation(m)) => m,
            other => panic!("expected a validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_defaults_to_mp3() {
        let audio = respond(request(), &ModelRegistry::default(), &MockGenerator::new())
            .await
            .unwrap();
        assert_eq!(audio.format, AudioFormat::Mp3);
        assert!(!audio.bytes.is_empty());
    }

    #[tokio::test]
    async fn test_wav_has_riff_header() {
        let mut raw = request();
        raw.response_format = Some("wav".into());
        let audio = respond(raw, &ModelRegistry::default(), &MockGenerator::new())
            .await
            .unwrap();
        assert_eq!(audio.format.content_type(), "audio/wav");
        assert_eq!(&audio.bytes[..4], b"RIFF");
        assert_eq!(&audio.bytes[8..12], b"WAVE");
    }

    #[test]
    fn test_rejects_bad_fields() {
        let mut raw = request();
        raw.model = "gpt-4o".into();
        assert!(rejected(raw).starts_with("Invalid 'model'"));

        let mut raw = request();
        raw.input = " ".into();
        assert!(rejected(raw).starts_with("Invalid 'input'"));

        let mut raw = request();
        raw.input = "a".repeat(MAX_INPUT_CHARS + 1);
        assert!(rejected(raw).starts_with("Invalid 'input'"));

        let mut raw = request();
        raw.voice = "robot".into();
        assert!(rejected(raw).starts_with("Invalid 'voice'"));

        let mut raw = request();
        raw.response_format = Some("ogg".into());
        assert!(rejected(raw).starts_with("Invalid 'response_format'"));

        let mut raw = request();
        raw.speed = Some(5.0);
        assert!(rejected(raw).starts_with("Invalid 'speed'"));
    }

    #[tokio::test]
    async fn test_generator_failure_is_500() {
        let err = respond(request(), &ModelRegistry::default(), &ScriptedGenerator::new(vec![]))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Generation(_)));
    }
}
