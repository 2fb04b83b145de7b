use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde_json::json;
use sha2::{Digest, Sha256};

use super::{ContentGenerator, GeneratedPayload, GeneratedToolCall, GeneratorError, schema};
use crate::chat::request::{JsonOutput, ToolChoice};
use crate::models::audio::AudioFormat;
use crate::models::chat::{ChatMessage, ToolDefinition};
use crate::models::images::{ImageData, ImageFormat};

const WORDS: &[&str] = &[
    "lorem", "ipsum", "dolor", "sit", "amet", "consectetur", "adipiscing", "elit", "sed", "do",
    "eiusmod", "tempor", "incididunt", "ut", "labore", "et", "dolore", "magna", "aliqua", "enim",
    "ad", "minim", "veniam", "quis", "nostrud", "exercitation", "ullamco", "laboris", "nisi",
    "aliquip", "ex", "ea", "commodo", "consequat", "duis", "aute", "irure", "in", "voluptate",
];

// 1x1 transparent PNG
const PLACEHOLDER_PNG: &str =
    "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAQAAAC1HAwCAAAAC0lEQVR42mNkYAAAAAYAAjCB0C8AAAAASUVORK5CYII=";

// 16-bit mono
const SAMPLE_RATE: u32 = 24_000;

/// Placeholder text, schema-shaped JSON, tool calls, unit vectors, images
/// and silent speech.
#[derive(Debug, Default, Clone)]
pub struct MockGenerator;

impl MockGenerator {
    pub fn new() -> Self {
        Self
    }

    fn sentence<R: Rng>(rng: &mut R) -> String {
        let count = rng.gen_range(12..48);
        let words: Vec<&str> = (0..count)
            .filter_map(|_| WORDS.choose(&mut *rng).copied())
            .collect();
        format!("{}.", capitalize(&words.join(" ")))
    }

    // which tool, if any, the mock answers with
    fn pick_tool<'a>(
        messages: &[ChatMessage],
        tools: &'a [ToolDefinition],
        tool_choice: &ToolChoice,
    ) -> Option<&'a ToolDefinition> {
        match tool_choice {
            ToolChoice::None => None,
            ToolChoice::Required => tools.first(),
            ToolChoice::Function(name) => tools.iter().find(|t| &t.function.name == name),
            ToolChoice::Auto => {
                let last = messages
                    .iter()
                    .rev()
                    .find(|m| m.role == "user")?
                    .text()
                    .to_lowercase();
                tools
                    .iter()
                    .find(|t| last.contains(&t.function.name.to_lowercase()))
            }
        }
    }
}

// maps a u32 onto [-1, 1]
fn unit_interval(v: u32) -> f32 {
    (f64::from(v) / f64::from(u32::MAX) * 2.0 - 1.0) as f32
}

fn wav(pcm: &[u8]) -> Vec<u8> {
    let data_len = pcm.len() as u32;
    let mut out = Vec::with_capacity(44 + pcm.len());
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&(36 + data_len).to_le_bytes());
    out.extend_from_slice(b"WAVEfmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes()); // PCM
    out.extend_from_slice(&1u16.to_le_bytes()); // mono
    out.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
    out.extend_from_slice(&(SAMPLE_RATE * 2).to_le_bytes());
    out.extend_from_slice(&2u16.to_le_bytes());
    out.extend_from_slice(&16u16.to_le_bytes());
    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_len.to_le_bytes());
    out.extend_from_slice(pcm);
    out
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(c) => c.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[async_trait]
impl ContentGenerator for MockGenerator {
    async fn chat_content(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolDefinition],
        tool_choice: &ToolChoice,
        json_output: Option<&JsonOutput>,
    ) -> Result<GeneratedPayload, GeneratorError> {
        if let Some(tool) = Self::pick_tool(messages, tools, tool_choice) {
            let parameters = tool
                .function
                .parameters
                .clone()
                .unwrap_or_else(|| json!({"type": "object"}));
            return Ok(GeneratedPayload::ToolCalls(vec![GeneratedToolCall {
                name: tool.function.name.clone(),
                arguments: schema::sample(&parameters),
            }]));
        }

        let mut rng = StdRng::from_entropy();
        let content = match json_output {
            Some(JsonOutput { schema: Some(s) }) => schema::sample(s).to_string(),
            Some(JsonOutput { schema: None }) => {
                json!({ "message": Self::sentence(&mut rng) }).to_string()
            }
            None => Self::sentence(&mut rng),
        };
        Ok(GeneratedPayload::Text(content))
    }

    async fn embedding(&self, input: &str, dimensions: usize) -> Result<Vec<f32>, GeneratorError> {
        // sha256 blocks of (input, block index), so identical input yields an
        // identical vector on every build
        let raw: Vec<f32> = (0..dimensions.div_ceil(8) as u64)
            .flat_map(|block| {
                let digest = Sha256::new()
                    .chain_update(input.as_bytes())
                    .chain_update(block.to_le_bytes())
                    .finalize();
                digest
                    .chunks_exact(4)
                    .map(|b| unit_interval(u32::from_le_bytes([b[0], b[1], b[2], b[3]])))
                    .collect::<Vec<_>>()
            })
            .take(dimensions)
            .collect();
        let norm = raw.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm == 0.0 {
            return Err(GeneratorError::Failed("degenerate embedding".to_string()));
        }
        Ok(raw.into_iter().map(|v| v / norm).collect())
    }

    async fn image(
        &self,
        prompt: &str,
        size: &str,
        format: ImageFormat,
    ) -> Result<ImageData, GeneratorError> {
        let mut data = ImageData {
            revised_prompt: Some(prompt.to_string()),
            ..ImageData::default()
        };
        match format {
            ImageFormat::Url => {
                data.url = Some(format!(
                    "https://placehold.co/{size}/png?id={}",
                    uuid::Uuid::new_v4().simple()
                ))
            }
            ImageFormat::B64Json => data.b64_json = Some(PLACEHOLDER_PNG.to_string()),
        }
        Ok(data)
    }

    // Silence, about 50ms per input character at normal speed. Compressed
    // formats carry the raw samples under their own content type.
    async fn speech(
        &self,
        input: &str,
        _voice: &str,
        format: AudioFormat,
        speed: f64,
    ) -> Result<Vec<u8>, GeneratorError> {
        let seconds = (input.chars().count() as f64 * 0.05 / speed).clamp(0.1, 30.0);
        let samples = (seconds * f64::from(SAMPLE_RATE)) as usize;
        let pcm = vec![0u8; samples * 2];
        Ok(match format {
            AudioFormat::Wav => wav(&pcm),
            _ => pcm,
        })
    }
}
