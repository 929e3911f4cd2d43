//! The public RAG service.
//!
//! [`RagService`] validates caller input, applies the configured windows and
//! limits, and delegates to its [`RagBackend`]. It is `Send + Sync`; share it
//! with `Arc` and keep one [`Conversation`] per caller.

use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use tracing::{info, instrument, warn};

use crate::backend::{ConversationalAnswer, RagBackend, RagStats};
use crate::config::RagConfig;
use crate::conversation::{Conversation, ConversationExchange, recent};
use crate::document::{Document, DocumentInput, Metadata, SearchResult};
use crate::error::{RagError, Result};
use crate::fixture::FixtureBackend;

/// Retrieval-augmented generation over an in-memory knowledge base.
///
/// # Example
///
/// ```rust
/// use flowdesk_rag::RagService;
///
/// let service = RagService::fixture();
/// assert!(service.is_fixture());
/// assert_eq!(service.config().top_k, 5);
/// ```
#[derive(Clone)]
pub struct RagService {
    backend: Arc<dyn RagBackend>,
}

impl std::fmt::Debug for RagService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RagService")
            .field("config", self.config())
            .field("fixture", &self.is_fixture())
            .finish_non_exhaustive()
    }
}

impl RagService {
    /// Create a service over `backend`.
    ///
    /// The configuration and fixture flag are the backend's own.
    pub fn new(backend: Arc<dyn RagBackend>) -> Self {
        Self { backend }
    }

    /// Create a service answering from the seed knowledge base and canned replies.
    pub fn fixture() -> Self {
        Self::new(Arc::new(FixtureBackend::new()))
    }

    /// Create a service from the environment.
    ///
    /// Uses the OpenAI clients when `OPENAI_API_KEY` holds a usable key. Otherwise
    /// falls back to fixture mode, or fails with [`RagError::NotConfigured`]
    /// when `config.fixture_fallback` is disabled.
    #[cfg(feature = "openai")]
    pub fn from_env(config: RagConfig) -> Result<Self> {
        use crate::openai::{
            OpenAIChatModel, OpenAIEmbeddingProvider, OpenAISettings, RAG_TEMPERATURE,
        };
        use crate::pipeline::LiveBackend;

        config.validate()?;
        match OpenAISettings::from_env() {
            Some(settings) => {
                let backend = LiveBackend::builder()
                    .config(config)
                    .embedding_provider(Arc::new(OpenAIEmbeddingProvider::new(settings.clone())))
                    .language_model(Arc::new(OpenAIChatModel::new(settings, RAG_TEMPERATURE)))
                    .build()?;
                Ok(Self::new(Arc::new(backend)))
            }
            None => Self::fallback(config),
        }
    }

    /// Create a service from the environment.
    ///
    /// Built without the `openai` feature there are no live clients, so this
    /// is fixture mode, or [`RagError::NotConfigured`] when
    /// `config.fixture_fallback` is disabled.
    #[cfg(not(feature = "openai"))]
    pub fn from_env(config: RagConfig) -> Result<Self> {
        config.validate()?;
        Self::fallback(config)
    }

    fn fallback(config: RagConfig) -> Result<Self> {
        if !config.fixture_fallback {
            return Err(RagError::NotConfigured(
                "OPENAI_API_KEY is not set and fixture fallback is disabled".into(),
            ));
        }
        warn!("OpenAI API key not configured, RAG service running in fixture mode");
        let backend = FixtureBackend::new().with_config(config)?;
        Ok(Self::new(Arc::new(backend)))
    }

    /// The active configuration.
    pub fn config(&self) -> &RagConfig {
        self.backend.config()
    }

    /// Whether the service answers from fixtures.
    pub fn is_fixture(&self) -> bool {
        self.backend.is_fixture()
    }

    /// Ingest one document.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if `content` is empty.
    pub async fn add_document(&self, content: &str, metadata: Metadata) -> Result<Document> {
        if content.trim().is_empty() {
            return Err(RagError::config("document content must not be empty"));
        }
        let document = Document::new(content, metadata);
        self.backend.ingest(std::slice::from_ref(&document)).await?;

        info!(document.id = %document.id, "document added");
        Ok(document)
    }

    /// Ingest a batch of documents; either all become searchable or none.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if any input has empty content, and
    /// propagates embedding and index failures.
    #[instrument(skip_all, fields(document_count = inputs.len()))]
    pub async fn add_documents(&self, inputs: Vec<DocumentInput>) -> Result<Vec<Document>> {
        if let Some(position) = inputs.iter().position(|i| i.content.trim().is_empty()) {
            return Err(RagError::ConfigError(format!(
                "document at position {position} has empty content"
            )));
        }

        let documents: Vec<Document> =
            inputs.into_iter().map(|i| Document::new(i.content, i.metadata)).collect();
        self.backend.ingest(&documents).await?;

        for doc in &documents {
            info!(document.id = %doc.id, "document added");
        }
        Ok(documents)
    }

    /// Ingest the contents of a text file under `filename`.
    pub async fn add_text_file(&self, text: &str, filename: &str) -> Result<Document> {
        let metadata = Metadata::from([
            ("source".to_string(), json!("file")),
            ("filename".to_string(), json!(filename)),
            ("type".to_string(), json!("text")),
            ("addedAt".to_string(), json!(Utc::now().to_rfc3339())),
        ]);
        self.add_document(text, metadata).await
    }

    /// Return the `k` chunks most relevant to `query`, best first.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if `k` is zero or `query` is blank, and
    /// [`RagError::EmptyIndex`] if nothing has been indexed.
    pub async fn search(&self, query: &str, k: usize) -> Result<Vec<SearchResult>> {
        if k == 0 {
            return Err(RagError::config("k must be greater than zero"));
        }
        if query.trim().is_empty() {
            return Err(RagError::config("query must not be empty"));
        }
        self.backend.search(query, k).await
    }

    /// Answer `question`.
    ///
    /// Explicit `context` is used verbatim. Without it, `use_retrieval` grounds
    /// the answer in the top chunks, and an empty index degrades to a general
    /// knowledge answer.
    pub async fn generate_answer(
        &self,
        question: &str,
        context: Option<&str>,
        use_retrieval: bool,
    ) -> Result<String> {
        if question.trim().is_empty() {
            return Err(RagError::config("question must not be empty"));
        }
        self.backend.answer(question, context, use_retrieval).await
    }

    /// Answer `question` in the light of the most recent exchanges of `history`.
    ///
    /// Only the last `history_window` exchanges are used.
    pub async fn conversational_rag(
        &self,
        question: &str,
        history: &[ConversationExchange],
    ) -> Result<ConversationalAnswer> {
        if question.trim().is_empty() {
            return Err(RagError::config("question must not be empty"));
        }
        let window = recent(history, self.config().history_window);
        self.backend.converse(question, window).await
    }

    /// One turn of a stateful conversation.
    ///
    /// On success the exchange is appended to `conversation`; on failure it is
    /// left untouched.
    pub async fn converse(
        &self,
        conversation: &mut Conversation,
        question: &str,
    ) -> Result<ConversationalAnswer> {
        let turn = self.conversational_rag(question, conversation.exchanges()).await?;
        conversation.record(question, turn.answer.clone());
        Ok(turn)
    }

    /// Summarize the chunks relevant to `query`, or the knowledge base at large.
    pub async fn summarize(&self, query: Option<&str>) -> Result<String> {
        let query = query.filter(|q| !q.trim().is_empty());
        self.backend.summarize(query).await
    }

    /// Report index counters.
    pub async fn stats(&self) -> RagStats {
        self.backend.stats().await
    }

    /// Discard every ingested document.
    pub async fn reset(&self) {
        self.backend.reset().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockEmbeddingProvider, MockLlm};
    use crate::pipeline::LiveBackend;

    fn live(embedder: Arc<MockEmbeddingProvider>, llm: Arc<MockLlm>) -> RagService {
        let backend = LiveBackend::builder()
            .embedding_provider(embedder)
            .language_model(llm)
            .build()
            .unwrap();
        RagService::new(Arc::new(backend))
    }

    #[tokio::test]
    async fn empty_content_is_rejected_before_embedding() {
        let embedder = Arc::new(MockEmbeddingProvider::new(16));
        let service = live(embedder.clone(), Arc::new(MockLlm::new("ok")));

        let err = service
            .add_documents(vec![
                DocumentInput::new("fine", Metadata::new()),
                DocumentInput::new("   ", Metadata::new()),
            ])
            .await
            .unwrap_err();
        assert!(err.is_caller_error());
        assert!(embedder.inputs().is_empty());
        assert_eq!(service.stats().await.chunk_count, 0);
    }

    #[tokio::test]
    async fn zero_k_is_a_caller_error() {
        let service = live(Arc::new(MockEmbeddingProvider::new(16)), Arc::new(MockLlm::new("ok")));
        assert!(matches!(service.search("sky", 0).await, Err(RagError::ConfigError(_))));
    }

    #[tokio::test]
    async fn search_on_empty_index_skips_embedding() {
        let embedder = Arc::new(MockEmbeddingProvider::new(16));
        let service = live(embedder.clone(), Arc::new(MockLlm::new("ok")));
        assert!(matches!(service.search("sky", 3).await, Err(RagError::EmptyIndex)));
        assert!(embedder.inputs().is_empty());
    }

    #[tokio::test]
    async fn failed_turn_leaves_conversation_untouched() {
        let service =
            live(Arc::new(MockEmbeddingProvider::new(16)), Arc::new(MockLlm::failing("down")));
        service.add_document("The sky is blue.", Metadata::new()).await.unwrap();

        let mut conversation = Conversation::new();
        let err = service.converse(&mut conversation, "What color is the sky?").await.unwrap_err();
        assert!(matches!(err, RagError::GenerationError { .. }));
        assert!(conversation.is_empty());
    }

    #[tokio::test]
    async fn config_and_mode_come_from_the_backend() {
        let config = RagConfig::builder().top_k(2).history_window(1).build().unwrap();
        let backend = LiveBackend::builder()
            .config(config)
            .embedding_provider(Arc::new(MockEmbeddingProvider::new(16)))
            .build()
            .unwrap();
        let service = RagService::new(Arc::new(backend));
        assert_eq!(service.config().top_k, 2);
        assert_eq!(service.config().history_window, 1);
        assert!(!service.is_fixture());

        let service = RagService::new(Arc::new(FixtureBackend::new()));
        assert!(service.is_fixture());
        assert!(service.stats().await.fixture);
    }

    #[tokio::test]
    async fn text_files_are_tagged() {
        let service = RagService::fixture();
        let doc = service.add_text_file("release notes", "notes.txt").await.unwrap();
        assert_eq!(doc.metadata["source"], json!("file"));
        assert_eq!(doc.metadata["filename"], json!("notes.txt"));
        assert_eq!(doc.metadata["type"], json!("text"));
        assert!(doc.metadata["addedAt"].is_string());
    }

    #[cfg(not(feature = "openai"))]
    #[test]
    fn disabled_fallback_without_live_clients_is_not_configured() {
        let config = RagConfig::builder().fixture_fallback(false).build().unwrap();
        assert!(matches!(RagService::from_env(config), Err(RagError::NotConfigured(_))));
        assert!(RagService::from_env(RagConfig::default()).unwrap().is_fixture());
    }
}
