use async_trait::async_trait;
use bytes::Bytes;
use futures::{future, stream, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::http_client::HttpClientTrait;
use crate::domain::text::{collapse_whitespace, ends_sentence};
use crate::domain::{DomainError, GenerationRequest, GenerativeBackend, TextStream};

const DEFAULT_OLLAMA_BASE_URL: &str = "http://localhost:11434";

/// Sampling options forwarded verbatim in the request's `options` object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OllamaOptions {
    pub temperature: f32,
    pub top_k: u32,
    pub top_p: f32,
    pub repeat_penalty: f32,
    pub num_ctx: u32,
}

impl Default for OllamaOptions {
    fn default() -> Self {
        Self {
            temperature: 1.0,
            top_k: 20,
            top_p: 1.0,
            repeat_penalty: 1.2,
            num_ctx: 1024,
        }
    }
}

/// Streaming backend for a local Ollama server
#[derive(Debug)]
pub struct OllamaBackend<C: HttpClientTrait> {
    client: C,
    base_url: String,
    model: String,
    keep_alive: String,
    options: OllamaOptions,
}

impl<C: HttpClientTrait> OllamaBackend<C> {
    pub fn new(client: C, model: impl Into<String>) -> Self {
        Self::with_base_url(client, model, DEFAULT_OLLAMA_BASE_URL)
    }

    pub fn with_base_url(
        client: C,
        model: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            keep_alive: "5m".to_string(),
            options: OllamaOptions::default(),
        }
    }

    /// How long the server keeps the model loaded after a request, e.g. `5m`
    pub fn with_keep_alive(mut self, keep_alive: impl Into<String>) -> Self {
        self.keep_alive = keep_alive.into();
        self
    }

    pub fn with_options(mut self, options: OllamaOptions) -> Self {
        self.options = options;
        self
    }

    fn generate_url(&self) -> String {
        format!("{}/api/generate", self.base_url)
    }

    fn build_request(&self, request: &GenerationRequest) -> serde_json::Value {
        let mut body = serde_json::json!({
            "model": self.model,
            "prompt": request.prompt,
            "stream": true,
            "keep_alive": self.keep_alive,
            "options": self.options,
        });

        if let Some(system) = &request.system {
            body["system"] = serde_json::json!(system);
        }

        body
    }
}

#[async_trait]
impl<C: HttpClientTrait + 'static> GenerativeBackend for OllamaBackend<C> {
    async fn generate(&self, request: GenerationRequest) -> Result<TextStream, DomainError> {
        let url = self.generate_url();
        let body = self.build_request(&request);

        debug!(model = %self.model, url = %url, "Starting generation");
        let byte_stream = self.client.post_json_stream(&url, &body).await?;

        let stream = byte_stream
            .map(Some)
            .chain(stream::once(future::ready(None)))
            .scan(SentenceAssembler::default(), |assembler, item| {
                let out = match item {
                    Some(Ok(bytes)) => assembler.feed(&bytes),
                    Some(Err(e)) => vec![Err(e)],
                    None => assembler.finish(),
                };
                future::ready(Some(stream::iter(out)))
            })
            .flatten();

        Ok(Box::pin(stream))
    }

    /// Asks the server to evict the model right away (`keep_alive: 0`)
    async fn unload(&self) -> Result<(), DomainError> {
        let body = serde_json::json!({
            "model": self.model,
            "keep_alive": 0,
        });

        self.client.post_json(&self.generate_url(), &body).await?;
        debug!(model = %self.model, "Model unloaded");
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "ollama"
    }
}

/// One NDJSON line of a streaming `/api/generate` response
#[derive(Debug, Deserialize)]
struct OllamaStreamLine {
    #[serde(default)]
    response: String,
    #[serde(default)]
    error: Option<String>,
}

/// Reassembles NDJSON lines split across network chunks and groups
/// token deltas into whole sentences
#[derive(Debug, Default)]
struct SentenceAssembler {
    pending: Vec<u8>,
    text: String,
}

impl SentenceAssembler {
    fn feed(&mut self, bytes: &Bytes) -> Vec<Result<String, DomainError>> {
        self.pending.extend_from_slice(bytes);

        let mut out = Vec::new();
        while let Some(pos) = self.pending.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=pos).collect();
            self.push_line(&line, &mut out);
        }
        out
    }

    fn finish(&mut self) -> Vec<Result<String, DomainError>> {
        let mut out = Vec::new();

        let rest = std::mem::take(&mut self.pending);
        self.push_line(&rest, &mut out);

        let remainder = collapse_whitespace(&std::mem::take(&mut self.text));
        if !remainder.is_empty() {
            out.push(Ok(remainder));
        }
        out
    }

    fn push_line(&mut self, line: &[u8], out: &mut Vec<Result<String, DomainError>>) {
        let line = String::from_utf8_lossy(line);
        let line = line.trim();
        if line.is_empty() {
            return;
        }

        let parsed: OllamaStreamLine = match serde_json::from_str(line) {
            Ok(parsed) => parsed,
            Err(e) => {
                out.push(Err(DomainError::backend(
                    "ollama",
                    format!("Invalid stream line: {}", e),
                )));
                return;
            }
        };

        if let Some(error) = parsed.error {
            out.push(Err(DomainError::backend("ollama", error)));
            return;
        }

        self.text.push_str(&parsed.response);
        if ends_sentence(&self.text) {
            let sentence = collapse_whitespace(&std::mem::take(&mut self.text));
            if !sentence.is_empty() {
                out.push(Ok(sentence));
            }
        }
    }
}
