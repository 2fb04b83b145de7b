use rand::Rng;

use crate::chat::request::AssemblyParams;
use crate::chat::transform;
use crate::error::ApiError;
use crate::generator::GeneratedPayload;
use crate::models::chat::{FinishReason, FunctionCall};

#[derive(Debug, Clone, PartialEq)]
pub enum CompletionOutput {
    Text(String),
    ToolCalls(Vec<FunctionCall>),
}

/// One generation after the request parameters were applied.
#[derive(Debug, Clone, PartialEq)]
pub struct AssembledCompletion {
    pub output: CompletionOutput,
    pub finish_reason: FinishReason,
    pub completion_tokens: usize,
}

/// Turn a generator payload into a finished completion. Tool calls are
/// passed through untouched unless their arguments overflow `max_tokens`;
/// text goes through the transform pipeline.
pub fn assemble<R: Rng>(
    payload: GeneratedPayload,
    params: &AssemblyParams<'_>,
    rng: &mut R,
) -> Result<AssembledCompletion, ApiError> {
    match payload {
        GeneratedPayload::ToolCalls(calls) if !calls.is_empty() => {
            let calls: Vec<FunctionCall> = calls
                .into_iter()
                .map(|c| FunctionCall {
                    arguments: c.serialized_arguments(),
                    name: c.name,
                })
                .collect();
            let argument_tokens: usize = calls.iter().map(|c| c.arguments.chars().count()).sum();

            if let Some(max) = params.max_tokens {
                if argument_tokens > max as usize {
                    return Err(ApiError::MaxTokensExceeded(format!(
                        "Could not finish the tool call: the generated arguments need {argument_tokens} tokens \
                         but max_tokens is {max}. Please try again with a higher max_tokens."
                    )));
                }
            }

            Ok(AssembledCompletion {
                output: CompletionOutput::ToolCalls(calls),
                finish_reason: FinishReason::ToolCalls,
                completion_tokens: argument_tokens,
            })
        }
        // an empty tool-call list counts as an empty text response
        GeneratedPayload::ToolCalls(_) => assemble_text(String::new(), params, rng),
        GeneratedPayload::Text(content) => assemble_text(content, params, rng),
    }
}

fn assemble_text<R: Rng>(
    content: String,
    params: &AssemblyParams<'_>,
    rng: &mut R,
) -> Result<AssembledCompletion, ApiError> {
    let transformed = transform::apply_all(&content, params, rng);
    let length = transformed.chars().count();
    let finish_reason = if length != content.chars().count() {
        FinishReason::Length
    } else {
        FinishReason::Stop
    };

    Ok(AssembledCompletion {
        output: CompletionOutput::Text(transformed),
        finish_reason,
        completion_tokens: length,
    })
}
