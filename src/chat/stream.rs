//! Streamed chat completions.
//!
//! [`prepare`] does all the fallible work up front and returns a
//! [`ChunkStream`], a plain iterator over the chunks to send. [`drive`] pulls
//! from it and pushes SSE payloads into a channel, checking before every
//! chunk that the client is still there.

use std::collections::VecDeque;

use chrono::Utc;
use rand::Rng;
use tokio::sync::mpsc;
use tracing::{debug, error};

use super::assembler::{self, CompletionOutput};
use super::request::ChatRequest;
use super::{completion_id, tokens, tool_call_id};
use crate::error::ApiError;
use crate::generator::ContentGenerator;
use crate::models::chat::{
    ChatCompletionChunk, ChunkChoice, Delta, FinishReason, FunctionCall, ToolCallDelta, Usage,
};

/// Terminator frame payload.
pub const SSE_DONE: &str = "[DONE]";

#[derive(Debug)]
enum ChunkBody {
    Text(String),
    ToolCall(FunctionCall),
}

#[derive(Debug)]
pub struct ChunkStream {
    id: String,
    created: i64,
    model: String,
    // one id shared by every tool-call chunk of the stream
    call_id: String,
    bodies: VecDeque<ChunkBody>,
    emitted: u32,
    finish_reason: FinishReason,
    usage: Option<Usage>,
}

impl ChunkStream {
    fn chunk(&self, choices: Vec<ChunkChoice>, usage: Option<Usage>) -> ChatCompletionChunk {
        ChatCompletionChunk {
            id: self.id.clone(),
            object: "chat.completion.chunk",
            created: self.created,
            model: self.model.clone(),
            choices,
            usage,
        }
    }
}

impl Iterator for ChunkStream {
    type Item = ChatCompletionChunk;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(body) = self.bodies.pop_front() {
            let delta = match body {
                ChunkBody::Text(text) => Delta {
                    role: "assistant",
                    content: Some(format!("{text} ")),
                    tool_calls: None,
                },
                ChunkBody::ToolCall(function) => Delta {
                    role: "assistant",
                    content: None,
                    tool_calls: Some(vec![ToolCallDelta {
                        index: self.emitted,
                        id: self.call_id.clone(),
                        kind: "function",
                        function,
                    }]),
                },
            };
            self.emitted += 1;
            let finish_reason = self.bodies.is_empty().then_some(self.finish_reason);
            return Some(self.chunk(
                vec![ChunkChoice {
                    index: 0,
                    delta,
                    finish_reason,
                }],
                None,
            ));
        }

        // usage-only chunk after the last content chunk
        let usage = self.usage.take()?;
        Some(self.chunk(Vec::new(), Some(usage)))
    }
}

/// Run the single generation of a streamed request. Errors here surface
/// before any byte of the stream is written.
pub async fn prepare<R: Rng>(
    request: &ChatRequest,
    generator: &dyn ContentGenerator,
    rng: &mut R,
) -> Result<ChunkStream, ApiError> {
    let prompt_tokens = tokens::prompt_tokens(&request.messages, &request.tools);
    let payload = generator
        .chat_content(
            &request.messages,
            &request.tools,
            &request.tool_choice,
            request.json_output.as_ref(),
        )
        .await?;
    let done = assembler::assemble(payload, &request.assembly_params(), rng)?;

    let bodies = match done.output {
        CompletionOutput::Text(text) => VecDeque::from([ChunkBody::Text(text)]),
        CompletionOutput::ToolCalls(calls) => calls.into_iter().map(ChunkBody::ToolCall).collect(),
    };

    Ok(ChunkStream {
        id: completion_id(),
        created: Utc::now().timestamp(),
        model: request.model.clone(),
        call_id: tool_call_id(),
        bodies,
        emitted: 0,
        finish_reason: done.finish_reason,
        usage: request
            .include_usage
            .then(|| Usage::new(prompt_tokens, done.completion_tokens)),
    })
}

/// Emit every chunk, then the `[DONE]` marker. Stops quietly once the
/// receiving side is gone.
pub async fn drive(chunks: ChunkStream, tx: mpsc::Sender<String>) {
    let stream_id = chunks.id.clone();
    for chunk in chunks {
        if tx.is_closed() {
            debug!(id = %stream_id, "client went away, stream stopped");
            return;
        }
        let data = match serde_json::to_string(&chunk) {
            Ok(data) => data,
            Err(e) => {
                error!(id = %stream_id, error = %e, "failed to encode chunk");
                return;
            }
        };
        if tx.send(data).await.is_err() {
            debug!(id = %stream_id, "client went away, stream stopped");
            return;
        }
        // let the transport flush before the next chunk
        tokio::task::yield_now().await;
    }

    if tx.send(SSE_DONE.to_string()).await.is_ok() {
        debug!(id = %stream_id, "stream complete");
    }
}
