use chrono::Utc;
use futures::future::try_join_all;
use rand::Rng;
use tracing::debug;

use super::assembler::{self, CompletionOutput};
use super::request::ChatRequest;
use super::{completion_id, tokens, tool_call_id};
use crate::error::ApiError;
use crate::generator::ContentGenerator;
use crate::models::chat::{AssistantMessage, ChatCompletion, Choice, ToolCall, Usage};

/// Produce a complete `chat.completion` body with `request.n` choices.
///
/// Generations run concurrently and the first failure aborts the whole
/// response. Usage reports the completion tokens of the last choice only.
pub async fn respond<R: Rng>(
    request: &ChatRequest,
    generator: &dyn ContentGenerator,
    rng: &mut R,
) -> Result<ChatCompletion, ApiError> {
    let prompt_tokens = tokens::prompt_tokens(&request.messages, &request.tools);

    let generations = (0..request.n).map(|_| {
        generator.chat_content(
            &request.messages,
            &request.tools,
            &request.tool_choice,
            request.json_output.as_ref(),
        )
    });
    let payloads = try_join_all(generations).await?;

    let params = request.assembly_params();
    let mut choices = Vec::with_capacity(payloads.len());
    let mut completion_tokens = 0;
    for (index, payload) in payloads.into_iter().enumerate() {
        let done = assembler::assemble(payload, &params, rng)?;
        completion_tokens = done.completion_tokens;
        choices.push(Choice {
            index: index as u32,
            message: assistant_message(done.output),
            finish_reason: done.finish_reason,
        });
    }

    debug!(model = %request.model, choices = choices.len(), prompt_tokens, completion_tokens, "chat completion assembled");

    Ok(ChatCompletion {
        id: completion_id(),
        object: "chat.completion",
        created: Utc::now().timestamp(),
        model: request.model.clone(),
        choices,
        usage: Usage::new(prompt_tokens, completion_tokens),
    })
}

fn assistant_message(output: CompletionOutput) -> AssistantMessage {
    match output {
        CompletionOutput::Text(content) => AssistantMessage {
            role: "assistant",
            content: Some(content),
            tool_calls: None,
        },
        CompletionOutput::ToolCalls(calls) => AssistantMessage {
            role: "assistant",
            content: None,
            tool_calls: Some(
                calls
                    .into_iter()
                    .map(|function| ToolCall {
                        id: tool_call_id(),
                        kind: "function",
                        function,
                    })
                    .collect(),
            ),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::testing::{ScriptedGenerator, chat_request};
    use crate::generator::{GeneratedPayload, GeneratedToolCall};
    use crate::models::chat::FinishReason;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use serde_json::json;

    #[tokio::test]
    async fn test_n_choices_in_call_order() {
        let generator = ScriptedGenerator::new(vec![
            Ok(GeneratedPayload::Text("first answer".into())),
            Ok(GeneratedPayload::Text("second".into())),
            Ok(GeneratedPayload::Text("third one".into())),
        ]);
        let mut request = chat_request();
        request.n = 3;

        let completion = respond(&request, &generator, &mut StdRng::seed_from_u64(0))
            .await
            .unwrap();

        assert_eq!(completion.object, "chat.completion");
        assert!(completion.id.starts_with("chatcmpl-"));
        let indexes: Vec<u32> = completion.choices.iter().map(|c| c.index).collect();
        assert_eq!(indexes, vec![0, 1, 2]);
        assert_eq!(completion.choices[1].message.content.as_deref(), Some("second"));
        // usage carries the last generation only
        assert_eq!(completion.usage.completion_tokens, "third one".len());
        assert_eq!(completion.usage.prompt_tokens, "hello".len());
        assert_eq!(completion.usage.total_tokens, 5 + 9);
    }

    #[tokio::test]
    async fn test_any_failure_aborts_everything() {
        let generator = ScriptedGenerator::new(vec![
            Ok(GeneratedPayload::Text("ok".into())),
            Err("backend exploded".into()),
        ]);
        let mut request = chat_request();
        request.n = 2;

        let err = respond(&request, &generator, &mut StdRng::seed_from_u64(0))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Generation(_)));
    }

    #[tokio::test]
    async fn test_tool_call_overflow_aborts() {
        let generator = ScriptedGenerator::new(vec![Ok(GeneratedPayload::ToolCalls(vec![
            GeneratedToolCall {
                name: "lookup".into(),
                arguments: json!({"query": "something long"}),
            },
        ]))]);
        let mut request = chat_request();
        request.max_tokens = Some(3);

        let err = respond(&request, &generator, &mut StdRng::seed_from_u64(0))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::MaxTokensExceeded(_)));
    }

    #[tokio::test]
    async fn test_tool_call_message_shape() {
        let generator = ScriptedGenerator::new(vec![Ok(GeneratedPayload::ToolCalls(vec![
            GeneratedToolCall {
                name: "lookup".into(),
                arguments: json!({"q": "x"}),
            },
        ]))]);
        let completion = respond(&chat_request(), &generator, &mut StdRng::seed_from_u64(0))
            .await
            .unwrap();

        let choice = &completion.choices[0];
        assert_eq!(choice.finish_reason, FinishReason::ToolCalls);
        let value = serde_json::to_value(&choice.message).unwrap();
        assert_eq!(value["content"], serde_json::Value::Null);
        assert_eq!(value["tool_calls"][0]["type"], "function");
        assert_eq!(value["tool_calls"][0]["function"]["arguments"], r#"{"q":"x"}"#);
        assert!(value["tool_calls"][0]["id"].as_str().unwrap().starts_with("call_"));
    }
}
