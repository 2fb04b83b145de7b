//! Chat completions: validation, content shaping and the two responders.

pub mod assembler;
pub mod request;
pub mod responder;
pub mod stream;
pub mod tokens;
pub mod transform;
pub mod validation;

use uuid::Uuid;

pub fn completion_id() -> String {
    format!("chatcmpl-{}", Uuid::new_v4().simple())
}

pub fn tool_call_id() -> String {
    format!("call_{}", Uuid::new_v4().simple())
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use serde_json::Value;

    use super::request::{ChatRequest, JsonOutput, ToolChoice};
    use crate::generator::{ContentGenerator, GeneratedPayload, GeneratorError};
    use crate::models::audio::AudioFormat;
    use crate::models::chat::{ChatMessage, ToolDefinition};
    use crate::models::images::{ImageData, ImageFormat};

    // Hands out queued payloads in call order; plain text once the queue is empty.
    pub struct ScriptedGenerator {
        queue: Mutex<VecDeque<Result<GeneratedPayload, String>>>,
    }

    impl ScriptedGenerator {
        pub fn new(script: Vec<Result<GeneratedPayload, String>>) -> Self {
            Self {
                queue: Mutex::new(script.into()),
            }
        }
    }

    #[async_trait]
    impl ContentGenerator for ScriptedGenerator {
        async fn chat_content(
            &self,
            _messages: &[ChatMessage],
            _tools: &[ToolDefinition],
            _tool_choice: &ToolChoice,
            _json_output: Option<&JsonOutput>,
        ) -> Result<GeneratedPayload, GeneratorError> {
            let next = self.queue.lock().unwrap().pop_front();
            match next {
                Some(Ok(payload)) => Ok(payload),
                Some(Err(message)) => Err(GeneratorError::Failed(message)),
                None => Ok(GeneratedPayload::Text("scripted".into())),
            }
        }

        async fn embedding(&self, _input: &str, dimensions: usize) -> Result<Vec<f32>, GeneratorError> {
            Ok(vec![0.0; dimensions])
        }

        async fn image(
            &self,
            _prompt: &str,
            _size: &str,
            _format: ImageFormat,
        ) -> Result<ImageData, GeneratorError> {
            Err(GeneratorError::Failed("no images in scripts".into()))
        }

        async fn speech(
            &self,
            _input: &str,
            _voice: &str,
            _format: AudioFormat,
            _speed: f64,
        ) -> Result<Vec<u8>, GeneratorError> {
            Err(GeneratorError::Failed("no audio in scripts".into()))
        }
    }

    pub fn chat_request() -> ChatRequest {
        ChatRequest {
            model: "gpt-4o".into(),
            messages: vec![ChatMessage {
                role: "user".into(),
                content: Some(Value::String("hello".into())),
                name: None,
                tool_calls: None,
                tool_call_id: None,
            }],
            tools: Vec::new(),
            tool_choice: ToolChoice::None,
            temperature: 0.0,
            top_p: 1.0,
            frequency_penalty: 0.0,
            presence_penalty: 0.0,
            stop: Vec::new(),
            max_tokens: None,
            n: 1,
            stream: false,
            include_usage: false,
            json_output: None,
        }
    }
}
