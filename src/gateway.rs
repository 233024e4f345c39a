//! LLM gateway abstraction and implementations.
//!
//! Defines the [`GenerateClient`] trait and concrete implementations:
//! - **[`DisabledClient`]** — returns errors; used when no gateway is configured.
//! - **[`GeminiClient`]** — calls the Google generative-language API with
//!   retry and backoff.
//!
//! The client is constructed once at startup via [`create_client`] and
//! passed by reference into every component that needs it; nothing in the
//! pipeline holds ambient gateway state.
//!
//! # Retry Strategy
//!
//! The Gemini client uses exponential backoff for transient errors:
//! - HTTP 429 (rate limited) and 5xx (server error) → retry
//! - HTTP 4xx (client error, not 429) → fail immediately
//! - Network errors → retry
//! - Backoff: 1s, 2s, 4s, 8s, 16s, 32s (capped at 2^5)
//!
//! Gateway failures are *not* recovered inside the pipeline; they propagate
//! to the caller. Only unparseable-but-successful replies are degraded
//! locally (see [`crate::parse`]).

use anyhow::{bail, Result};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::config::GatewayConfig;

/// Trait for LLM text-generation backends.
///
/// `generate` blocks until the full reply is available. `generate_stream`
/// returns a [`TextStream`]: a lazy, finite, forward-only sequence of text
/// fragments the consumer must drain to completion; it cannot be restarted.
#[async_trait]
pub trait GenerateClient: Send + Sync {
    /// Returns the model identifier (e.g. `"gemini-1.5-flash"`).
    fn model_name(&self) -> &str;

    /// Generate a full reply for the prompt.
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Generate a reply as a stream of text fragments.
    async fn generate_stream(&self, prompt: &str) -> Result<TextStream>;
}

/// A lazy, finite sequence of text fragments from a streaming generation
/// call. Pull fragments with [`TextStream::next`] until it returns `None`.
pub struct TextStream {
    response: Option<reqwest::Response>,
    buffer: String,
    pending: std::collections::VecDeque<String>,
}

impl TextStream {
    fn new(response: reqwest::Response) -> Self {
        TextStream {
            response: Some(response),
            buffer: String::new(),
            pending: std::collections::VecDeque::new(),
        }
    }

    /// A stream over pre-computed fragments. Lets alternative
    /// [`GenerateClient`] implementations satisfy the streaming contract
    /// without an HTTP response.
    pub fn from_fragments(fragments: Vec<String>) -> Self {
        TextStream {
            response: None,
            buffer: String::new(),
            pending: fragments.into(),
        }
    }

    /// Next text fragment, or `None` once the stream is exhausted.
    pub async fn next(&mut self) -> Option<Result<String>> {
        loop {
            if let Some(fragment) = self.pending.pop_front() {
                return Some(Ok(fragment));
            }

            let response = self.response.as_mut()?;
            match response.chunk().await {
                Ok(Some(bytes)) => {
                    self.buffer.push_str(&String::from_utf8_lossy(&bytes));
                    self.drain_events();
                }
                Ok(None) => {
                    self.response = None;
                    self.drain_events();
                    if self.pending.is_empty() {
                        return None;
                    }
                }
                Err(e) => {
                    self.response = None;
                    return Some(Err(e.into()));
                }
            }
        }
    }

    /// Drain the full stream into one string.
    pub async fn collect(mut self) -> Result<String> {
        let mut out = String::new();
        while let Some(fragment) = self.next().await {
            out.push_str(&fragment?);
        }
        Ok(out)
    }

    /// Parse complete SSE `data:` lines out of the buffer into fragments.
    fn drain_events(&mut self) {
        while let Some(pos) = self.buffer.find('\n') {
            let line: String = self.buffer.drain(..=pos).collect();
            let line = line.trim();
            let Some(payload) = line.strip_prefix("data:") else {
                continue;
            };
            let payload = payload.trim();
            if payload.is_empty() || payload == "[DONE]" {
                continue;
            }
            if let Ok(json) = serde_json::from_str::<serde_json::Value>(payload) {
                if let Some(text) = extract_candidate_text(&json) {
                    if !text.is_empty() {
                        self.pending.push_back(text);
                    }
                }
            }
        }
    }
}

// ============ Disabled Client ============

/// A no-op gateway that always returns errors.
///
/// Used when `gateway.provider = "disabled"` in the configuration; lets
/// offline commands (chunking, config checks) run without credentials.
pub struct DisabledClient;

#[async_trait]
impl GenerateClient for DisabledClient {
    fn model_name(&self) -> &str {
        "disabled"
    }

    async fn generate(&self, _prompt: &str) -> Result<String> {
        bail!("Gateway is disabled. Set [gateway] provider in config.")
    }

    async fn generate_stream(&self, _prompt: &str) -> Result<TextStream> {
        bail!("Gateway is disabled. Set [gateway] provider in config.")
    }
}

// ============ Gemini Client ============

/// Gateway backed by the Google generative-language REST API.
///
/// Requires the API key environment variable named by
/// `gateway.api_key_env` (default `GEMINI_API_KEY`) to be set.
pub struct GeminiClient {
    model: String,
    api_key: String,
    max_retries: u32,
    client: reqwest::Client,
}

const GEMINI_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

impl GeminiClient {
    /// Create a new Gemini client from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the API key environment variable is not set
    /// or the HTTP client cannot be built.
    pub fn new(config: &GatewayConfig) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env)
            .map_err(|_| anyhow::anyhow!("{} environment variable not set", config.api_key_env))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            model: config.model.clone(),
            api_key,
            max_retries: config.max_retries,
            client,
        })
    }

    fn request_body(prompt: &str) -> serde_json::Value {
        serde_json::json!({
            "contents": [{ "parts": [{ "text": prompt }] }]
        })
    }

    async fn post_with_retry(&self, url: &str, prompt: &str) -> Result<reqwest::Response> {
        let body = Self::request_body(prompt);
        let mut last_err = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                // Exponential backoff: 1s, 2s, 4s, 8s, ...
                let delay = Duration::from_secs(1 << (attempt - 1).min(5));
                tokio::time::sleep(delay).await;
            }

            let resp = self
                .client
                .post(url)
                .header("Content-Type", "application/json")
                .json(&body)
                .send()
                .await;

            match resp {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        return Ok(response);
                    }

                    // Rate limited or server error — retry
                    if status.as_u16() == 429 || status.is_server_error() {
                        let body_text = response.text().await.unwrap_or_default();
                        last_err =
                            Some(anyhow::anyhow!("Gemini API error {}: {}", status, body_text));
                        continue;
                    }

                    // Client error (not 429) — don't retry
                    let body_text = response.text().await.unwrap_or_default();
                    bail!("Gemini API error {}: {}", status, body_text);
                }
                Err(e) => {
                    last_err = Some(e.into());
                    continue;
                }
            }
        }

        Err(last_err.unwrap_or_else(|| anyhow::anyhow!("Generation failed after retries")))
    }
}

#[async_trait]
impl GenerateClient for GeminiClient {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        let url = format!(
            "{}/{}:generateContent?key={}",
            GEMINI_BASE, self.model, self.api_key
        );
        let response = self.post_with_retry(&url, prompt).await?;
        let json: serde_json::Value = response.json().await?;

        extract_candidate_text(&json)
            .map(|t| t.trim().to_string())
            .ok_or_else(|| anyhow::anyhow!("Gemini response contained no candidate text"))
    }

    async fn generate_stream(&self, prompt: &str) -> Result<TextStream> {
        let url = format!(
            "{}/{}:streamGenerateContent?alt=sse&key={}",
            GEMINI_BASE, self.model, self.api_key
        );
        let response = self.post_with_retry(&url, prompt).await?;
        Ok(TextStream::new(response))
    }
}

/// Extract the concatenated text parts of the first candidate from a
/// generate-content response body.
fn extract_candidate_text(json: &serde_json::Value) -> Option<String> {
    let parts = json
        .get("candidates")?
        .as_array()?
        .first()?
        .get("content")?
        .get("parts")?
        .as_array()?;

    let text: String = parts
        .iter()
        .filter_map(|p| p.get("text").and_then(|t| t.as_str()))
        .collect();

    Some(text)
}

/// Create the appropriate [`GenerateClient`] based on configuration.
///
/// # Supported Providers
///
/// | Config Value | Client |
/// |-------------|--------|
/// | `"disabled"` | [`DisabledClient`] |
/// | `"gemini"` | [`GeminiClient`] |
pub fn create_client(config: &GatewayConfig) -> Result<Arc<dyn GenerateClient>> {
    match config.provider.as_str() {
        "disabled" => Ok(Arc::new(DisabledClient)),
        "gemini" => Ok(Arc::new(GeminiClient::new(config)?)),
        other => bail!("Unknown gateway provider: {}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_candidate_text() {
        let body = json!({
            "candidates": [{
                "content": { "parts": [{ "text": "Hello " }, { "text": "world" }] }
            }]
        });
        assert_eq!(extract_candidate_text(&body).as_deref(), Some("Hello world"));
    }

    #[test]
    fn test_extract_candidate_text_missing() {
        assert_eq!(extract_candidate_text(&json!({})), None);
        assert_eq!(extract_candidate_text(&json!({"candidates": []})), None);
    }

    #[tokio::test]
    async fn test_disabled_client_errors() {
        let client = DisabledClient;
        assert!(client.generate("hi").await.is_err());
        assert!(client.generate_stream("hi").await.is_err());
    }

    #[test]
    fn test_create_client_rejects_unknown() {
        let cfg = GatewayConfig {
            provider: "openai".to_string(),
            ..GatewayConfig::default()
        };
        assert!(create_client(&cfg).is_err());
    }

    #[test]
    fn test_create_disabled() {
        let cfg = GatewayConfig {
            provider: "disabled".to_string(),
            ..GatewayConfig::default()
        };
        let client = create_client(&cfg).unwrap();
        assert_eq!(client.model_name(), "disabled");
    }
}
