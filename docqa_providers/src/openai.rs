use std::time::Duration;

use async_trait::async_trait;
use docqa_core::{Embedder, Generation, GenerationError, TextGenerator, Turn, Usage};
use reqwest::{Client, StatusCode};
use serde_json::{Value, json};
use tracing::{debug, info};

use crate::retry::{RetryPolicy, retry_with_backoff};

/// Connection and model settings for an OpenAI-compatible API.
#[derive(Debug, Clone)]
pub struct ProviderSettings {
    pub api_key: String,
    pub base_url: String,
    pub chat_model: String,
    pub embedding_model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub request_timeout: Duration,
    /// Backoff applied to transient failures
    pub retry: RetryPolicy,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://api.openai.com/v1".to_string(),
            chat_model: "gpt-3.5-turbo".to_string(),
            embedding_model: "text-embedding-ada-002".to_string(),
            max_tokens: 512,
            temperature: 0.7,
            request_timeout: Duration::from_secs(120),
            retry: RetryPolicy::default(),
        }
    }
}

/// Text generation and embeddings over `/chat/completions` and
/// `/embeddings`.
pub struct OpenAIProvider {
    client: Client,
    settings: ProviderSettings,
}

impl OpenAIProvider {
    pub fn new(settings: ProviderSettings) -> anyhow::Result<Self> {
        info!(
            "Creating OpenAI-compatible provider: base_url={}, chat_model={}",
            settings.base_url, settings.chat_model
        );
        let client = Client::builder()
            .timeout(settings.request_timeout)
            .build()?;

        Ok(Self { client, settings })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.settings.base_url.trim_end_matches('/'))
    }

    async fn post(&self, path: &str, request: &Value) -> anyhow::Result<Value> {
        let response = self
            .client
            .post(self.endpoint(path))
            .bearer_auth(&self.settings.api_key)
            .json(request)
            .send()
            .await?
            .error_for_status()?
            .json::<Value>()
            .await?;
        Ok(response)
    }

    fn chat_request(&self, prompt: &str) -> Value {
        json!({
            "model": self.settings.chat_model,
            "max_tokens": self.settings.max_tokens,
            "temperature": self.settings.temperature,
            "messages": [Turn::user(prompt)],
        })
    }
}

/// Server errors, 429 and transport failures are retried. Other statuses
/// and undecodable bodies fail at once.
fn is_transient(error: &anyhow::Error) -> bool {
    match error.downcast_ref::<reqwest::Error>() {
        Some(e) => match e.status() {
            Some(status) => status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS,
            None => !e.is_decode(),
        },
        None => false,
    }
}

/// Convert f64 to f32 for embedding values.
#[expect(clippy::cast_possible_truncation, reason = "embeddings use f32")]
const fn f64_to_f32(x: f64) -> f32 {
    x as f32
}

fn token_count(usage: &serde_json::Map<String, Value>, key: &str) -> u32 {
    usage
        .get(key)
        .and_then(Value::as_u64)
        .and_then(|n| u32::try_from(n).ok())
        .unwrap_or(0)
}

fn parse_chat_response(response: &Value) -> anyhow::Result<Generation> {
    let content = response["choices"][0]["message"]["content"]
        .as_str()
        .ok_or_else(|| anyhow::anyhow!("Invalid response format: missing content"))?
        .to_string();

    let usage = response["usage"].as_object().map(|u| Usage {
        prompt_tokens: token_count(u, "prompt_tokens"),
        completion_tokens: token_count(u, "completion_tokens"),
        total_tokens: token_count(u, "total_tokens"),
    });

    Ok(Generation { content, usage })
}

fn parse_embedding_response(response: &Value) -> anyhow::Result<Vec<f32>> {
    response["data"][0]["embedding"]
        .as_array()
        .ok_or_else(|| anyhow::anyhow!("Invalid response format: missing embedding"))?
        .iter()
        .map(|v| {
            v.as_f64()
                .map(f64_to_f32)
                .ok_or_else(|| anyhow::anyhow!("Invalid embedding value"))
        })
        .collect()
}

#[async_trait]
impl TextGenerator for OpenAIProvider {
    async fn generate(&self, prompt: &str) -> Result<Generation, GenerationError> {
        let request = self.chat_request(prompt);

        info!(
            "Sending chat completion request: model={}",
            self.settings.chat_model
        );

        let response = retry_with_backoff(
            || self.post("chat/completions", &request),
            &self.settings.retry,
            is_transient,
        )
        .await?;
        let generation = parse_chat_response(&response)?;

        info!("Received chat completion response");
        Ok(generation)
    }
}

#[async_trait]
impl Embedder for OpenAIProvider {
    async fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        let request = json!({
            "model": self.settings.embedding_model,
            "input": text,
        });

        debug!("Embedding {} characters", text.len());

        let response = retry_with_backoff(
            || self.post("embeddings", &request),
            &self.settings.retry,
            is_transient,
        )
        .await?;
        parse_embedding_response(&response)
    }
}
