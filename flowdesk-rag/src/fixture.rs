//! Offline backend used when no credential is configured.
//!
//! [`FixtureBackend`] keeps whole documents in memory (no chunking, no
//! embeddings), answers searches by substring match and generates text from
//! a [`FixtureModel`] keyword table. It starts with a small seed knowledge base
//! describing the platform, and [`reset`](RagBackend::reset) restores it.

use async_trait::async_trait;
use serde_json::json;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::backend::{ConversationalAnswer, RagBackend, RagStats};
use crate::config::RagConfig;
use crate::conversation::ConversationExchange;
use crate::document::{Chunk, Document, Metadata, SearchResult};
use crate::error::Result;
use crate::generation::FixtureModel;

/// Number of sources returned with a fixture conversational turn.
const CONVERSATION_SOURCES: usize = 3;

const SEED: [(&str, &str, &str); 4] = [
    (
        "demo-1",
        "Platform Overview",
        "The AI/ML Flowise Platform is a comprehensive solution for building and deploying AI \
         workflows. It integrates with various AI services and provides a visual interface for \
         creating complex AI applications.",
    ),
    (
        "demo-2",
        "ML Capabilities",
        "Machine Learning models can be trained for client-side inference. This allows for \
         real-time predictions without server round trips, improving user experience and \
         reducing latency.",
    ),
    (
        "demo-3",
        "RAG Technology",
        "RAG (Retrieval-Augmented Generation) combines information retrieval with language \
         generation. It searches through documents to find relevant context and uses that \
         information to generate accurate, contextual responses.",
    ),
    (
        "demo-4",
        "Security Features",
        "The platform supports various authentication methods including OAuth 2.0, SSO, and \
         guest access. Security is implemented at multiple layers with proper token validation \
         and session management.",
    ),
];

/// The seed knowledge base, in order.
pub fn seed_documents() -> Vec<Document> {
    SEED.iter()
        .map(|(id, title, content)| Document {
            id: (*id).to_string(),
            content: (*content).to_string(),
            metadata: Metadata::from([
                ("source".to_string(), json!("demo")),
                ("title".to_string(), json!(title)),
            ]),
        })
        .collect()
}

/// A [`RagBackend`] answering from an in-memory document list and canned replies.
#[derive(Debug)]
pub struct FixtureBackend {
    config: RagConfig,
    documents: RwLock<Vec<Document>>,
    model: FixtureModel,
}

impl Default for FixtureBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl FixtureBackend {
    /// Create a backend holding the seed knowledge base.
    pub fn new() -> Self {
        Self::with_model(FixtureModel::knowledge_base())
    }

    /// Create a backend answering from `model` instead of the default table.
    pub fn with_model(model: FixtureModel) -> Self {
        Self { config: RagConfig::default(), documents: RwLock::new(seed_documents()), model }
    }

    /// Report `config` as the active configuration.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`](crate::RagError::ConfigError) if
    /// `config` is invalid.
    pub fn with_config(mut self, config: RagConfig) -> Result<Self> {
        config.validate()?;
        self.config = config;
        Ok(self)
    }

    /// A snapshot of the documents currently held.
    pub async fn documents(&self) -> Vec<Document> {
        self.documents.read().await.clone()
    }
}

fn as_result(document: &Document, score: f32) -> SearchResult {
    SearchResult { chunk: Chunk::new(document.content.clone(), document, 0), score }
}

fn matches(document: &Document, needle: &str) -> bool {
    document.content.to_lowercase().contains(needle)
        || document.title().is_some_and(|t| t.to_lowercase().contains(needle))
}

fn first_sentence(text: &str) -> &str {
    text.find(". ").map_or(text, |end| &text[..=end])
}

#[async_trait]
impl RagBackend for FixtureBackend {
    fn config(&self) -> &RagConfig {
        &self.config
    }

    fn is_fixture(&self) -> bool {
        true
    }

    async fn ingest(&self, documents: &[Document]) -> Result<()> {
        let mut held = self.documents.write().await;
        held.extend_from_slice(documents);
        info!(document_count = documents.len(), total = held.len(), "ingested fixture documents");
        Ok(())
    }

    async fn search(&self, query: &str, k: usize) -> Result<Vec<SearchResult>> {
        let documents = self.documents.read().await;
        let needle = query.to_lowercase();

        let mut results: Vec<SearchResult> = documents
            .iter()
            .filter(|doc| matches(doc, &needle))
            .take(k)
            .map(|doc| as_result(doc, 1.0))
            .collect();
        if results.is_empty() {
            results = documents.iter().take(k).map(|doc| as_result(doc, 0.0)).collect();
        }

        debug!(result_count = results.len(), "fixture search");
        Ok(results)
    }

    async fn answer(
        &self,
        question: &str,
        _context: Option<&str>,
        _use_retrieval: bool,
    ) -> Result<String> {
        Ok(self.model.reply(question))
    }

    async fn converse(
        &self,
        question: &str,
        _history: &[ConversationExchange],
    ) -> Result<ConversationalAnswer> {
        let sources = self.search(question, CONVERSATION_SOURCES).await?;
        Ok(ConversationalAnswer { answer: self.model.reply(question), sources })
    }

    async fn summarize(&self, _query: Option<&str>) -> Result<String> {
        let documents = self.documents.read().await;
        let mut summary = String::from("Summary of Available Documents:\n");
        for doc in documents.iter() {
            let title = doc.title().unwrap_or(&doc.id);
            summary.push_str(&format!("\n• {title}: {}", first_sentence(&doc.content)));
        }
        summary.push_str(
            "\n\nThe platform integrates modern AI technologies with user-friendly interfaces \
             and enterprise-grade security.",
        );
        Ok(summary)
    }

    async fn stats(&self) -> RagStats {
        let count = self.documents.read().await.len();
        RagStats { chunk_count: count, document_count: count, has_store: true, fixture: true }
    }

    async fn reset(&self) {
        *self.documents.write().await = seed_documents();
        info!("fixture knowledge base restored");
    }
}
