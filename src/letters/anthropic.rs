//! Anthropic Messages API client.

use futures_util::future::BoxFuture;
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use super::prompt::build_letter_prompt;
use super::{LetterError, LetterFields, LetterGenerator};
use crate::models::LetterSource;

pub const DEFAULT_MODEL: &str = "claude-sonnet-4-5-20250929";
const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const API_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 2000;
const TIMEOUT_SECS: u64 = 120;

pub struct AnthropicClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl AnthropicClient {
    pub fn new(api_key: String, model: String) -> Result<Self, LetterError> {
        Self::with_base_url(DEFAULT_BASE_URL, api_key, model)
    }

    pub fn with_base_url(base_url: &str, api_key: String, model: String) -> Result<Self, LetterError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(TIMEOUT_SECS))
            .build()
            .map_err(|e| LetterError::HttpClient(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn post(&self, prompt: &str, stream: bool) -> Result<reqwest::Response, LetterError> {
        let body = MessagesRequest {
            model: &self.model,
            max_tokens: MAX_TOKENS,
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
            stream,
        };

        let response = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LetterError::HttpClient(format!("Request timed out after {TIMEOUT_SECS}s"))
                } else {
                    LetterError::HttpClient(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LetterError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<Message<'a>>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    stream: bool,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize)]
struct StreamEvent {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    delta: Option<StreamDelta>,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct StreamDelta {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

/// Text of the first content block, if it is a text block.
fn first_text(response: MessagesResponse) -> Result<String, LetterError> {
    match response.content.into_iter().next() {
        Some(block) if block.kind == "text" => block.text.ok_or(LetterError::EmptyResponse),
        _ => Err(LetterError::EmptyResponse),
    }
}

/// Splits a byte stream into SSE `data:` payloads. Bytes are held until a
/// full line arrives, so a character split across chunks decodes intact.
#[derive(Default)]
pub(crate) struct SseDataBuffer {
    pending: Vec<u8>,
}

impl SseDataBuffer {
    /// Feed a chunk; returns the `data:` payloads of every completed line.
    pub(crate) fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(chunk);
        let mut out = Vec::new();
        while let Some(pos) = self.pending.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&line);
            let line = line.trim_end_matches(['\n', '\r']);
            if let Some(data) = line.strip_prefix("data:") {
                out.push(data.trim_start().to_string());
            }
        }
        out
    }
}

/// Text carried by one stream event, or an error event.
fn delta_text(data: &str) -> Result<Option<String>, LetterError> {
    let event: StreamEvent =
        serde_json::from_str(data).map_err(|e| LetterError::ResponseParsing(e.to_string()))?;
    match event.kind.as_str() {
        "content_block_delta" => Ok(event
            .delta
            .filter(|d| d.kind == "text_delta")
            .and_then(|d| d.text)),
        "error" => Err(LetterError::Api {
            status: 500,
            body: event.error.map(|e| e.to_string()).unwrap_or_default(),
        }),
        _ => Ok(None),
    }
}

impl LetterGenerator for AnthropicClient {
    fn generate<'a>(&'a self, fields: &'a LetterFields) -> BoxFuture<'a, Result<String, LetterError>> {
        Box::pin(async move {
            let prompt = build_letter_prompt(fields);
            let response = self.post(&prompt, false).await?;
            let parsed: MessagesResponse = response
                .json()
                .await
                .map_err(|e| LetterError::ResponseParsing(e.to_string()))?;
            first_text(parsed)
        })
    }

    fn generate_streaming<'a>(
        &'a self,
        fields: &'a LetterFields,
        token_tx: mpsc::Sender<String>,
    ) -> BoxFuture<'a, Result<String, LetterError>> {
        Box::pin(async move {
            let prompt = build_letter_prompt(fields);
            let response = self.post(&prompt, true).await?;

            let mut stream = response.bytes_stream();
            let mut buffer = SseDataBuffer::default();
            let mut letter = String::new();

            while let Some(chunk) = stream.next().await {
                let chunk = chunk.map_err(|e| LetterError::HttpClient(e.to_string()))?;
                for data in buffer.push(&chunk) {
                    if let Some(text) = delta_text(&data)? {
                        letter.push_str(&text);
                        token_tx
                            .send(text)
                            .await
                            .map_err(|_| LetterError::Cancelled)?;
                    }
                }
            }

            if letter.is_empty() {
                return Err(LetterError::EmptyResponse);
            }
            Ok(letter)
        })
    }

    fn source(&self) -> LetterSource {
        LetterSource::Anthropic
    }
}
