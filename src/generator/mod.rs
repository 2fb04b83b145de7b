//! Synthetic content sources.
//!
//! The request pipeline only depends on [`ContentGenerator`]; the server
//! wires in [`MockGenerator`], tests substitute their own implementations.

mod mock;
pub mod schema;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::chat::request::{JsonOutput, ToolChoice};
use crate::models::audio::AudioFormat;
use crate::models::chat::{ChatMessage, ToolDefinition};
use crate::models::images::{ImageData, ImageFormat};

pub use mock::MockGenerator;

#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("content generation failed: {0}")]
    Failed(String),
}

/// Raw output of one chat generation, before any request parameter is applied.
#[derive(Debug, Clone, PartialEq)]
pub enum GeneratedPayload {
    Text(String),
    ToolCalls(Vec<GeneratedToolCall>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedToolCall {
    pub name: String,
    pub arguments: Value,
}

impl GeneratedToolCall {
    // arguments travel as a JSON string; a string value is taken as already encoded
    pub fn serialized_arguments(&self) -> String {
        match &self.arguments {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

#[async_trait]
pub trait ContentGenerator: Send + Sync {
    async fn chat_content(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolDefinition],
        tool_choice: &ToolChoice,
        json_output: Option<&JsonOutput>,
    ) -> Result<GeneratedPayload, GeneratorError>;

    async fn embedding(&self, input: &str, dimensions: usize) -> Result<Vec<f32>, GeneratorError>;

    async fn image(
        &self,
        prompt: &str,
        size: &str,
        format: ImageFormat,
    ) -> Result<ImageData, GeneratorError>;

    async fn speech(
        &self,
        input: &str,
        voice: &str,
        format: AudioFormat,
        speed: f64,
    ) -> Result<Vec<u8>, GeneratorError>;
}
