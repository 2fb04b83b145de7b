use crate::models::chat::{ChatMessage, ToolDefinition};

// Prompt size in character-tokens: message text plus the serialized tool list.
pub fn prompt_tokens(messages: &[ChatMessage], tools: &[ToolDefinition]) -> usize {
    let message_tokens: usize = messages.iter().map(|m| m.text().chars().count()).sum();
    let tool_tokens = if tools.is_empty() {
        0
    } else {
        serde_json::to_string(tools)
            .map(|s| s.chars().count())
            .unwrap_or(0)
    };
    message_tokens + tool_tokens
}
