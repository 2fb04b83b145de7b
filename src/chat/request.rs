use serde_json::Value;

use crate::models::chat::{ChatMessage, ToolDefinition};

/// A chat request that passed validation. Every knob holds its default when
/// the caller left it out.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub tools: Vec<ToolDefinition>,
    pub tool_choice: ToolChoice,
    pub temperature: f64,
    pub top_p: f64,
    pub frequency_penalty: f64,
    pub presence_penalty: f64,
    pub stop: Vec<String>,
    pub max_tokens: Option<u32>,
    pub n: u32,
    pub stream: bool,
    pub include_usage: bool,
    pub json_output: Option<JsonOutput>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolChoice {
    None,
    Auto,
    Required,
    // a specific function by name
    Function(String),
}

// JSON output mode, with the caller's schema for json_schema
#[derive(Debug, Clone, PartialEq)]
pub struct JsonOutput {
    pub schema: Option<Value>,
}

/// The request parameters the completion assembler applies to generated content.
#[derive(Debug, Clone, Copy)]
pub struct AssemblyParams<'a> {
    pub stop: &'a [String],
    pub max_tokens: Option<u32>,
    pub frequency_penalty: f64,
    pub presence_penalty: f64,
}

impl ChatRequest {
    pub fn assembly_params(&self) -> AssemblyParams<'_> {
        AssemblyParams {
            stop: &self.stop,
            max_tokens: self.max_tokens,
            frequency_penalty: self.frequency_penalty,
            presence_penalty: self.presence_penalty,
        }
    }
}
