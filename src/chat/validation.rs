//! Ordered validation of a chat completions request.
//!
//! Stages run in a fixed order and the first failure is reported; nothing
//! reaches the generator until every stage passed.

use std::ops::RangeInclusive;

use serde_json::Value;

use crate::chat::request::{ChatRequest, JsonOutput, ToolChoice};
use crate::error::ApiError;
use crate::models::chat::{ChatCompletionRequest, ChatMessage, ToolDefinition};
use crate::registry::{ModelKind, ModelRegistry, ModelSpec};

pub const MAX_STOP_SEQUENCES: usize = 4;
pub const MAX_GENERATIONS: i64 = 128;

type Stage<T> = Result<T, ApiError>;

pub fn validate(raw: ChatCompletionRequest, registry: &ModelRegistry) -> Stage<ChatRequest> {
    let temperature = bounded("temperature", raw.temperature.as_ref(), 0.0..=1.0, 0.0)?;
    let top_p = bounded("top_p", raw.top_p.as_ref(), 0.0..=1.0, 1.0)?;
    let frequency_penalty =
        bounded("frequency_penalty", raw.frequency_penalty.as_ref(), -2.0..=2.0, 0.0)?;
    let presence_penalty =
        bounded("presence_penalty", raw.presence_penalty.as_ref(), -2.0..=2.0, 0.0)?;
    let stop = stop_sequences(raw.stop.as_ref())?;
    let model = chat_model(registry, raw.model.as_ref())?;
    let max_tokens = max_output_tokens(
        raw.max_tokens.as_ref(),
        raw.max_completion_tokens.as_ref(),
        model,
    )?;
    let stream = flag("stream", raw.stream.as_ref())?;
    let include_usage = stream_options(stream, raw.stream_options.as_ref())?;
    let n = generation_count(raw.n.as_ref(), stream)?;
    let json_output = response_format(raw.response_format.as_ref())?;
    let tools = tool_definitions(raw.tools)?;
    let tool_choice = tool_choice(raw.tool_choice.as_ref(), &tools)?;
    let messages = messages(raw.messages)?;

    Ok(ChatRequest {
        model: model.id.clone(),
        messages,
        tools,
        tool_choice,
        temperature,
        top_p,
        frequency_penalty,
        presence_penalty,
        stop,
        max_tokens,
        n,
        stream,
        include_usage,
        json_output,
    })
}

fn bounded(
    field: &str,
    value: Option<&Value>,
    range: RangeInclusive<f64>,
    default: f64,
) -> Stage<f64> {
    let Some(value) = value else {
        return Ok(default);
    };
    match value.as_f64() {
        Some(v) if range.contains(&v) => Ok(v),
        _ => Err(ApiError::Validation(format!(
            "Invalid '{field}': {value}. Expected a number between {} and {}.",
            range.start(),
            range.end()
        ))),
    }
}

// a single string counts as a one-entry list
fn stop_sequences(stop: Option<&Value>) -> Stage<Vec<String>> {
    let stop = match stop {
        None => Vec::new(),
        Some(Value::String(s)) => vec![s.clone()],
        Some(Value::Array(items)) if items.iter().all(Value::is_string) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        Some(other) => {
            return Err(ApiError::Validation(format!(
                "Invalid 'stop': {other}. Expected a string or an array of strings."
            )));
        }
    };
    if stop.len() > MAX_STOP_SEQUENCES {
        return Err(ApiError::Validation(format!(
            "Invalid 'stop': {} sequences given. At most {MAX_STOP_SEQUENCES} stop sequences are allowed.",
            stop.len()
        )));
    }
    Ok(stop)
}

fn chat_model<'r>(registry: &'r ModelRegistry, id: Option<&Value>) -> Stage<&'r ModelSpec> {
    let id = match id {
        Some(Value::String(id)) => id,
        None => {
            return Err(ApiError::Validation(
                "Invalid 'model': a model id is required.".to_string(),
            ));
        }
        Some(other) => {
            return Err(ApiError::Validation(format!(
                "Invalid 'model': {other}. Expected a string."
            )));
        }
    };
    registry.find(ModelKind::Chat, id).ok_or_else(|| {
        ApiError::Validation(format!(
            "Invalid 'model': the model '{id}' does not exist or is not supported by {}.",
            ModelKind::Chat.endpoint()
        ))
    })
}

// max_completion_tokens wins over max_tokens; without either the model's
// ceiling is the limit
fn max_output_tokens(
    max_tokens: Option<&Value>,
    max_completion_tokens: Option<&Value>,
    model: &ModelSpec,
) -> Stage<Option<u32>> {
    let (field, value) = match (max_completion_tokens, max_tokens) {
        (Some(v), _) => ("max_completion_tokens", v),
        (None, Some(v)) => ("max_tokens", v),
        (None, None) => return Ok(model.max_output_tokens),
    };
    let requested = match value.as_u64() {
        Some(0) => {
            return Err(ApiError::Validation(format!(
                "Invalid '{field}': 0. Expected a value of at least 1."
            )));
        }
        Some(n) => n,
        None => {
            return Err(ApiError::Validation(format!(
                "Invalid '{field}': {value}. Expected a positive integer."
            )));
        }
    };
    let ceiling = model.max_output_tokens.map_or(u64::from(u32::MAX), u64::from);
    if requested > ceiling {
        return Err(ApiError::Validation(format!(
            "Invalid '{field}': {requested} is too large. The model '{}' supports at most {ceiling} completion tokens.",
            model.id
        )));
    }
    Ok(u32::try_from(requested).ok())
}

fn flag(field: &str, value: Option<&Value>) -> Stage<bool> {
    match value {
        None => Ok(false),
        Some(Value::Bool(b)) => Ok(*b),
        Some(other) => Err(ApiError::Validation(format!(
            "Invalid '{field}': {other}. Expected a boolean."
        ))),
    }
}

// returns include_usage
fn stream_options(stream: bool, options: Option<&Value>) -> Stage<bool> {
    match options {
        None => Ok(false),
        Some(_) if !stream => Err(ApiError::Validation(
            "Invalid 'stream_options': only allowed when 'stream' is true.".to_string(),
        )),
        Some(Value::Object(opts)) => flag("stream_options.include_usage", opts.get("include_usage")),
        Some(other) => Err(ApiError::Validation(format!(
            "Invalid 'stream_options': {other}. Expected an object."
        ))),
    }
}

fn generation_count(n: Option<&Value>, stream: bool) -> Stage<u32> {
    let n = match n {
        None => 1,
        Some(value) => value.as_i64().ok_or_else(|| {
            ApiError::Validation(format!("Invalid 'n': {value}. Expected an integer."))
        })?,
    };
    if !(1..=MAX_GENERATIONS).contains(&n) {
        return Err(ApiError::Validation(format!(
            "Invalid 'n': {n}. Expected a value between 1 and {MAX_GENERATIONS}."
        )));
    }
    if stream && n != 1 {
        return Err(ApiError::Validation(format!(
            "Invalid 'n': {n}. Only n=1 is supported when 'stream' is true."
        )));
    }
    Ok(n as u32)
}

fn response_format(format: Option<&Value>) -> Stage<Option<JsonOutput>> {
    let Some(format) = format else {
        return Ok(None);
    };
    let kind = format.get("type").and_then(Value::as_str).unwrap_or_default();
    match kind {
        "text" => Ok(None),
        "json_object" => Ok(Some(JsonOutput { schema: None })),
        "json_schema" => {
            let schema = match format.get("json_schema") {
                None | Some(Value::Null) => {
                    return Err(ApiError::Validation(
                        "Missing 'response_format.json_schema': required when type is 'json_schema'."
                            .to_string(),
                    ));
                }
                // a schema sent as a JSON string is decoded first
                Some(Value::String(s)) => serde_json::from_str::<Value>(s).map_err(|e| {
                    ApiError::Validation(format!(
                        "Invalid 'response_format.json_schema': not valid JSON ({e})."
                    ))
                })?,
                Some(other) => other.clone(),
            };
            if !schema.is_object() {
                return Err(ApiError::Validation(format!(
                    "Invalid 'response_format.json_schema': {schema}. Expected an object."
                )));
            }
            // OpenAI wraps the schema as {name, schema}; a bare schema is accepted too
            let schema = schema.get("schema").cloned().unwrap_or(schema);
            Ok(Some(JsonOutput { schema: Some(schema) }))
        }
        other => Err(ApiError::Validation(format!(
            "Invalid 'response_format.type': '{other}'. Expected one of 'text', 'json_object', 'json_schema'."
        ))),
    }
}

fn tool_choice(choice: Option<&Value>, tools: &[ToolDefinition]) -> Stage<ToolChoice> {
    let Some(choice) = choice else {
        return Ok(if tools.is_empty() { ToolChoice::None } else { ToolChoice::Auto });
    };

    match choice {
        Value::String(s) => {
            let parsed = match s.as_str() {
                "none" => return Ok(ToolChoice::None),
                "auto" => ToolChoice::Auto,
                "required" => ToolChoice::Required,
                other => {
                    return Err(ApiError::Validation(format!(
                        "Invalid 'tool_choice': '{other}'. Expected 'none', 'auto', 'required' or a function object."
                    )));
                }
            };
            if tools.is_empty() {
                return Err(ApiError::Validation(format!(
                    "Invalid 'tool_choice': '{s}' is only allowed when 'tools' are specified."
                )));
            }
            Ok(parsed)
        }
        Value::Object(_) => {
            let name = choice
                .get("function")
                .and_then(|f| f.get("name"))
                .and_then(Value::as_str)
                .ok_or_else(|| {
                    ApiError::Validation(format!(
                        "Invalid 'tool_choice': {choice}. Expected {{\"type\": \"function\", \"function\": {{\"name\": ...}}}}."
                    ))
                })?;
            if !tools.iter().any(|t| t.function.name == name) {
                return Err(ApiError::Validation(format!(
                    "Invalid 'tool_choice': function '{name}' is not one of the supplied tools."
                )));
            }
            Ok(ToolChoice::Function(name.to_string()))
        }
        other => Err(ApiError::Validation(format!(
            "Invalid 'tool_choice': {other}. Expected a string or a function object."
        ))),
    }
}

fn tool_definitions(tools: Option<Value>) -> Stage<Vec<ToolDefinition>> {
    match tools {
        None => Ok(Vec::new()),
        Some(value) => serde_json::from_value(value)
            .map_err(|e| ApiError::Validation(format!("Invalid 'tools': {e}."))),
    }
}

fn messages(messages: Option<Value>) -> Stage<Vec<ChatMessage>> {
    let messages: Vec<ChatMessage> = match messages {
        None => Vec::new(),
        Some(value) => serde_json::from_value(value)
            .map_err(|e| ApiError::Validation(format!("Invalid 'messages': {e}.")))?,
    };
    if messages.is_empty() {
        return Err(ApiError::Validation(
            "Invalid 'messages': expected a non-empty array of messages.".to_string(),
        ));
    }
    Ok(messages)
}
