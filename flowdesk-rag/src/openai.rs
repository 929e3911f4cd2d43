//! OpenAI embedding and chat clients.
//!
//! This module is only available when the `openai` feature is enabled.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::generation::{CompletionRequest, LanguageModel};

/// The default OpenAI API root.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// The default embedding model.
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-ada-002";

/// The dimensionality of `text-embedding-ada-002`.
pub const DEFAULT_EMBEDDING_DIMENSIONS: usize = 1536;

/// The default chat model.
pub const DEFAULT_CHAT_MODEL: &str = "gpt-3.5-turbo";

/// Sampling temperature for grounded answers.
pub const RAG_TEMPERATURE: f32 = 0.3;

/// Sampling temperature for the assistant agent.
pub const AGENT_TEMPERATURE: f32 = 0.7;

const PROVIDER: &str = "OpenAI";

/// Key values shipped in sample `.env` files that mean "no key".
const PLACEHOLDER_KEYS: [&str; 2] = ["your-openai-api-key-here", "demo-mode"];

/// Returns `true` if `key` looks like a real credential.
pub fn is_usable_key(key: &str) -> bool {
    let key = key.trim();
    !key.is_empty() && !PLACEHOLDER_KEYS.contains(&key)
}

/// Connection settings shared by the OpenAI clients.
#[derive(Clone)]
pub struct OpenAISettings {
    api_key: String,
    base_url: String,
    embedding_model: String,
    chat_model: String,
}

impl std::fmt::Debug for OpenAISettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAISettings")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("embedding_model", &self.embedding_model)
            .field("chat_model", &self.chat_model)
            .finish()
    }
}

impl OpenAISettings {
    /// Create settings for `api_key` with the default endpoint and models.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::NotConfigured`] if the key is empty or a placeholder.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if !is_usable_key(&api_key) {
            return Err(RagError::NotConfigured("OpenAI API key is missing or a placeholder".into()));
        }
        Ok(Self {
            api_key: api_key.trim().to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            chat_model: DEFAULT_CHAT_MODEL.to_string(),
        })
    }

    /// Read `OPENAI_API_KEY` and the optional `OPENAI_BASE_URL`.
    ///
    /// Returns `None` when the key is unset or a placeholder.
    pub fn from_env() -> Option<Self> {
        let key = std::env::var("OPENAI_API_KEY").ok()?;
        let settings = Self::new(key).ok()?;
        Some(match std::env::var("OPENAI_BASE_URL") {
            Ok(url) if !url.trim().is_empty() => settings.with_base_url(url),
            _ => settings,
        })
    }

    /// Point the clients at a compatible endpoint.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Override the embedding model.
    pub fn with_embedding_model(mut self, model: impl Into<String>) -> Self {
        self.embedding_model = model.into();
        self
    }

    /// Override the chat model.
    pub fn with_chat_model(mut self, model: impl Into<String>) -> Self {
        self.chat_model = model.into();
        self
    }

    /// The API root in use.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

/// POST `body` to `url` and decode the JSON reply, reporting failures through `fail`.
async fn post_json<B, R>(
    client: &reqwest::Client,
    url: &str,
    api_key: &str,
    body: &B,
    fail: fn(String) -> RagError,
) -> Result<R>
where
    B: Serialize + ?Sized,
    R: DeserializeOwned,
{
    let response =
        client.post(url).bearer_auth(api_key).json(body).send().await.map_err(|e| {
            error!(provider = PROVIDER, error = %e, "request failed");
            fail(format!("request failed: {e}"))
        })?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let detail =
            serde_json::from_str::<ErrorResponse>(&body).map(|e| e.error.message).unwrap_or(body);

        error!(provider = PROVIDER, %status, "API error");
        return Err(fail(format!("API returned {status}: {detail}")));
    }

    response.json().await.map_err(|e| {
        error!(provider = PROVIDER, error = %e, "failed to parse response");
        fail(format!("failed to parse response: {e}"))
    })
}

fn embedding_error(message: String) -> RagError {
    RagError::EmbeddingError { provider: PROVIDER.into(), message }
}

fn generation_error(message: String) -> RagError {
    RagError::GenerationError { provider: PROVIDER.into(), message }
}

// ── Embeddings ─────────────────────────────────────────────────────

/// An [`EmbeddingProvider`] backed by the OpenAI embeddings API.
///
/// # Example
///
/// ```rust,ignore
/// use flowdesk_rag::openai::{OpenAIEmbeddingProvider, OpenAISettings};
///
/// let provider = OpenAIEmbeddingProvider::new(OpenAISettings::new("sk-...")?);
/// let embedding = provider.embed("hello world").await?;
/// ```
#[derive(Debug)]
pub struct OpenAIEmbeddingProvider {
    client: reqwest::Client,
    settings: OpenAISettings,
    dimensions: usize,
}

impl OpenAIEmbeddingProvider {
    /// Create a provider from `settings`.
    pub fn new(settings: OpenAISettings) -> Self {
        Self { client: reqwest::Client::new(), settings, dimensions: DEFAULT_EMBEDDING_DIMENSIONS }
    }

    /// Declare the dimensionality of a non-default embedding model.
    pub fn with_dimensions(mut self, dims: usize) -> Self {
        self.dimensions = dims;
        self
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [&'a str],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

#[async_trait]
impl EmbeddingProvider for OpenAIEmbeddingProvider {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        debug!(provider = PROVIDER, text_len = text.len(), "embedding single text");

        let results = self.embed_batch(&[text]).await?;
        results
            .into_iter()
            .next()
            .ok_or_else(|| embedding_error("API returned empty response".into()))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!(
            provider = PROVIDER,
            batch_size = texts.len(),
            model = %self.settings.embedding_model,
            "embedding batch"
        );

        let url = format!("{}/embeddings", self.settings.base_url);
        let request = EmbeddingRequest { model: &self.settings.embedding_model, input: texts };
        let mut response: EmbeddingResponse =
            post_json(&self.client, &url, &self.settings.api_key, &request, embedding_error)
                .await?;

        response.data.sort_by_key(|d| d.index);
        Ok(response.data.into_iter().map(|d| d.embedding).collect())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

// ── Chat completions ───────────────────────────────────────────────

/// A [`LanguageModel`] backed by the OpenAI chat completions API.
///
/// The rendered prompt is sent as a single user message.
#[derive(Debug)]
pub struct OpenAIChatModel {
    client: reqwest::Client,
    settings: OpenAISettings,
    temperature: f32,
}

impl OpenAIChatModel {
    /// Create a chat model from `settings` sampling at `temperature`.
    pub fn new(settings: OpenAISettings, temperature: f32) -> Self {
        Self { client: reqwest::Client::new(), settings, temperature }
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: [ChatMessage<'a>; 1],
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

#[async_trait]
impl LanguageModel for OpenAIChatModel {
    fn name(&self) -> &str {
        &self.settings.chat_model
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        debug!(
            provider = PROVIDER,
            model = %self.settings.chat_model,
            prompt_len = request.prompt.len(),
            "chat completion"
        );

        let url = format!("{}/chat/completions", self.settings.base_url);
        let body = ChatRequest {
            model: &self.settings.chat_model,
            temperature: self.temperature,
            messages: [ChatMessage { role: "user", content: &request.prompt }],
        };
        let response: ChatResponse =
            post_json(&self.client, &url, &self.settings.api_key, &body, generation_error).await?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| generation_error("API returned no completion".into()))
    }
}
