//! The strategy seam between the service and its two modes of operation.
//!
//! [`RagService`](crate::RagService) is constructed over exactly one
//! [`RagBackend`]: [`LiveBackend`](crate::LiveBackend) runs the real
//! chunk → embed → index → retrieve → generate pipeline, and
//! [`FixtureBackend`](crate::FixtureBackend) answers from a seed knowledge
//! base and canned replies when no credential is configured. The choice is
//! made once, at construction.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::RagConfig;
use crate::conversation::ConversationExchange;
use crate::document::{Document, SearchResult};
use crate::error::Result;

/// Counters reported by [`RagService::stats`](crate::RagService::stats).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RagStats {
    /// Number of indexed chunks.
    pub chunk_count: usize,
    /// Number of distinct source documents.
    pub document_count: usize,
    /// Whether an index currently exists.
    pub has_store: bool,
    /// Whether the service is answering from fixtures.
    pub fixture: bool,
}

/// The result of one conversational turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationalAnswer {
    /// The model's reply, unmodified.
    pub answer: String,
    /// The chunks retrieved to ground the reply, best first.
    pub sources: Vec<SearchResult>,
}

/// One complete implementation of the RAG operations.
///
/// Inputs arrive validated: documents have non-empty content, `k >= 1`, and
/// `history` has already been cut down to the configured window.
#[async_trait]
pub trait RagBackend: Send + Sync {
    /// The configuration this backend was built with.
    fn config(&self) -> &RagConfig;

    /// Whether answers come from fixtures rather than live clients.
    fn is_fixture(&self) -> bool {
        false
    }

    /// Index `documents` as one batch; either all become searchable or none.
    async fn ingest(&self, documents: &[Document]) -> Result<()>;

    /// Return the `k` chunks most relevant to `query`.
    async fn search(&self, query: &str, k: usize) -> Result<Vec<SearchResult>>;

    /// Answer `question`, grounded in `context` when given, else in retrieved
    /// chunks when `use_retrieval` is set, else in general knowledge.
    async fn answer(&self, question: &str, context: Option<&str>, use_retrieval: bool)
    -> Result<String>;

    /// Answer `question` in the light of the recent `history`.
    async fn converse(
        &self,
        question: &str,
        history: &[ConversationExchange],
    ) -> Result<ConversationalAnswer>;

    /// Summarize the chunks relevant to `query`, or the knowledge base at large.
    async fn summarize(&self, query: Option<&str>) -> Result<String>;

    /// Report index counters.
    async fn stats(&self) -> RagStats;

    /// Discard everything that was ingested.
    async fn reset(&self);
}

/// Join chunk texts with paragraph breaks, in ranked order.
pub(crate) fn join_chunk_texts<'a>(texts: impl IntoIterator<Item = &'a str>) -> String {
    texts.into_iter().collect::<Vec<_>>().join("\n\n")
}
