//! Live RAG pipeline.
//!
//! [`LiveBackend`] coordinates the ingest and query workflows by composing an
//! [`EmbeddingProvider`], a [`VectorIndex`], a [`Chunker`], and an optional
//! [`LanguageModel`].
//!
//! # Example
//!
//! ```rust,ignore
//! use flowdesk_rag::{LiveBackend, RagConfig, RagService};
//!
//! let backend = LiveBackend::builder()
//!     .config(RagConfig::default())
//!     .embedding_provider(Arc::new(my_embedder))
//!     .language_model(Arc::new(my_model))
//!     .build()?;
//!
//! let service = RagService::new(Arc::new(backend));
//! ```

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, error, info};

use crate::backend::{ConversationalAnswer, RagBackend, RagStats, join_chunk_texts};
use crate::chunking::{Chunker, RecursiveChunker};
use crate::config::RagConfig;
use crate::conversation::{ConversationExchange, render_history};
use crate::document::{Document, SearchResult};
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::generation::{CompletionRequest, LanguageModel};
use crate::inmemory::InMemoryVectorIndex;
use crate::prompt::PromptTemplate;
use crate::vectorstore::{IndexEntry, VectorIndex};

/// The live pipeline: chunk → embed → index on the write path, and
/// embed → search → prompt → generate on the read path.
///
/// Construct one via [`LiveBackend::builder()`].
pub struct LiveBackend {
    config: RagConfig,
    embedding_provider: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn VectorIndex>,
    chunker: Arc<dyn Chunker>,
    language_model: Option<Arc<dyn LanguageModel>>,
}

impl std::fmt::Debug for LiveBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveBackend")
            .field("config", &self.config)
            .field("embedding_provider", &self.embedding_provider.name())
            .field("language_model", &self.language_model.as_ref().map(|m| m.name()))
            .finish_non_exhaustive()
    }
}

/// Run `fut`, failing with `on_timeout` once `limit` elapses.
async fn bounded<T>(
    limit: Option<Duration>,
    fut: impl Future<Output = Result<T>>,
    on_timeout: impl FnOnce(Duration) -> RagError,
) -> Result<T> {
    match limit {
        Some(limit) => tokio::time::timeout(limit, fut).await.map_err(|_| on_timeout(limit))?,
        None => fut.await,
    }
}

impl LiveBackend {
    /// Create a new [`LiveBackendBuilder`].
    pub fn builder() -> LiveBackendBuilder {
        LiveBackendBuilder::default()
    }

    /// Return a reference to the vector index.
    pub fn index(&self) -> &Arc<dyn VectorIndex> {
        &self.index
    }

    fn language_model(&self) -> Result<&Arc<dyn LanguageModel>> {
        self.language_model
            .as_ref()
            .ok_or_else(|| RagError::NotConfigured("no language model configured".to_string()))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let provider = self.embedding_provider.name().to_string();
        debug!(provider = %provider, batch_size = texts.len(), "embedding batch");
        let embeddings = bounded(
            self.config.request_timeout,
            self.embedding_provider.embed_batch(texts),
            |limit| RagError::EmbeddingError {
                provider: provider.clone(),
                message: format!("timed out after {limit:?}"),
            },
        )
        .await?;

        if embeddings.len() != texts.len() {
            return Err(RagError::EmbeddingError {
                provider,
                message: format!(
                    "expected {} embeddings, provider returned {}",
                    texts.len(),
                    embeddings.len()
                ),
            });
        }
        Ok(embeddings)
    }

    async fn embed_query(&self, query: &str) -> Result<Vec<f32>> {
        let provider = self.embedding_provider.name().to_string();
        bounded(self.config.request_timeout, self.embedding_provider.embed(query), |limit| {
            RagError::EmbeddingError { provider, message: format!("timed out after {limit:?}") }
        })
        .await
    }

    /// Retrieve the `k` most similar chunks to `query`.
    ///
    /// Checks for an empty index before spending an embedding call.
    async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<SearchResult>> {
        if self.index.is_empty().await {
            return Err(RagError::EmptyIndex);
        }

        let query_embedding = self.embed_query(query).await.inspect_err(|e| {
            error!(error = %e, "embedding failed during query");
        })?;
        let results = self.index.search(&query_embedding, k).await?;

        info!(result_count = results.len(), "query completed");
        Ok(results)
    }

    async fn generate(
        &self,
        model: &Arc<dyn LanguageModel>,
        template: PromptTemplate,
        values: &[(&str, &str)],
        input: &str,
    ) -> Result<String> {
        let request = CompletionRequest::new(template.render(values), input);
        let name = model.name().to_string();
        debug!(
            model = %name,
            template = template.name(),
            prompt_len = request.prompt.len(),
            "generating"
        );

        bounded(self.config.request_timeout, model.complete(&request), |limit| {
            RagError::GenerationError {
                provider: name.clone(),
                message: format!("timed out after {limit:?}"),
            }
        })
        .await
        .inspect_err(|e| error!(model = %name, error = %e, "generation failed"))
    }
}

#[async_trait]
impl RagBackend for LiveBackend {
    fn config(&self) -> &RagConfig {
        &self.config
    }

    async fn ingest(&self, documents: &[Document]) -> Result<()> {
        // 1. Chunk every document
        let chunks: Vec<_> = documents.iter().flat_map(|doc| self.chunker.chunk(doc)).collect();
        if chunks.is_empty() {
            info!(document_count = documents.len(), chunk_count = 0, "ingested documents (empty)");
            return Ok(());
        }

        // 2. Embed all chunk texts in one batch
        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        let embeddings = self.embed_batch(&texts).await.inspect_err(|e| {
            error!(error = %e, "embedding failed during ingestion");
        })?;

        // 3. Insert the whole batch at once
        let chunk_count = chunks.len();
        let entries =
            chunks.into_iter().zip(embeddings).map(|(c, v)| IndexEntry::new(c, v)).collect();
        self.index.insert(entries).await.inspect_err(|e| {
            error!(error = %e, "index insert failed during ingestion");
        })?;

        info!(document_count = documents.len(), chunk_count, "ingested documents");
        Ok(())
    }

    async fn search(&self, query: &str, k: usize) -> Result<Vec<SearchResult>> {
        self.retrieve(query, k).await
    }

    async fn answer(
        &self,
        question: &str,
        context: Option<&str>,
        use_retrieval: bool,
    ) -> Result<String> {
        let model = self.language_model()?;

        // An empty explicit context counts as absent.
        let context = match context.filter(|c| !c.is_empty()) {
            Some(context) => context.to_string(),
            None if use_retrieval => match self.retrieve(question, self.config.top_k).await {
                Ok(results) => join_chunk_texts(results.iter().map(|r| r.chunk.text.as_str())),
                Err(RagError::EmptyIndex) => {
                    debug!("no documents indexed, answering from general knowledge");
                    String::new()
                }
                Err(e) => return Err(e),
            },
            None => String::new(),
        };

        if context.is_empty() {
            let values = [("question", question)];
            self.generate(model, PromptTemplate::GENERAL_KNOWLEDGE, &values, question).await
        } else {
            self.generate(
                model,
                PromptTemplate::QUESTION_ANSWER,
                &[("context", &context), ("question", question)],
                question,
            )
            .await
        }
    }

    async fn converse(
        &self,
        question: &str,
        history: &[ConversationExchange],
    ) -> Result<ConversationalAnswer> {
        let history_text = render_history(history);
        let contextual_query = if history_text.is_empty() {
            question.to_string()
        } else {
            format!("Previous conversation:\n{history_text}\n\nCurrent question: {question}")
        };

        let sources = self.retrieve(&contextual_query, self.config.top_k).await?;
        let model = self.language_model()?;
        let context = join_chunk_texts(sources.iter().map(|r| r.chunk.text.as_str()));

        let answer = self
            .generate(
                model,
                PromptTemplate::CONVERSATIONAL,
                &[("context", &context), ("history", &history_text), ("question", question)],
                question,
            )
            .await?;

        Ok(ConversationalAnswer { answer, sources })
    }

    async fn summarize(&self, query: Option<&str>) -> Result<String> {
        let limit = self.config.summary_top_k;
        let texts: Vec<String> = match query {
            Some(query) => {
                self.retrieve(query, limit).await?.into_iter().map(|r| r.chunk.text).collect()
            }
            None => self.index.first_chunks(limit).await?.into_iter().map(|c| c.text).collect(),
        };
        let model = self.language_model()?;
        let content = join_chunk_texts(texts.iter().map(String::as_str));

        self.generate(model, PromptTemplate::SUMMARY, &[("content", &content)], query.unwrap_or(""))
            .await
    }

    async fn stats(&self) -> RagStats {
        let stats = self.index.stats().await;
        RagStats {
            chunk_count: stats.chunk_count,
            document_count: stats.document_count,
            has_store: stats.has_store,
            fixture: false,
        }
    }

    async fn reset(&self) {
        self.index.reset().await;
        info!("vector index cleared");
    }
}

/// Builder for constructing a [`LiveBackend`].
///
/// Only the embedding provider is required. The index defaults to an
/// [`InMemoryVectorIndex`] and the chunker to a [`RecursiveChunker`] sized from
/// the config. Without a language model, every generating operation fails
/// with [`RagError::NotConfigured`].
#[derive(Default)]
pub struct LiveBackendBuilder {
    config: Option<RagConfig>,
    embedding_provider: Option<Arc<dyn EmbeddingProvider>>,
    index: Option<Arc<dyn VectorIndex>>,
    chunker: Option<Arc<dyn Chunker>>,
    language_model: Option<Arc<dyn LanguageModel>>,
}

impl LiveBackendBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: RagConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the embedding provider.
    pub fn embedding_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedding_provider = Some(provider);
        self
    }

    /// Set the vector index backend.
    pub fn index(mut self, index: Arc<dyn VectorIndex>) -> Self {
        self.index = Some(index);
        self
    }

    /// Set the document chunker.
    pub fn chunker(mut self, chunker: Arc<dyn Chunker>) -> Self {
        self.chunker = Some(chunker);
        self
    }

    /// Set the language model used for answers, conversations and summaries.
    pub fn language_model(mut self, model: Arc<dyn LanguageModel>) -> Self {
        self.language_model = Some(model);
        self
    }

    /// Build the [`LiveBackend`].
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if the config is invalid, and
    /// [`RagError::NotConfigured`] if no embedding provider was set.
    pub fn build(self) -> Result<LiveBackend> {
        let config = self.config.unwrap_or_default();
        config.validate()?;
        let embedding_provider = self.embedding_provider.ok_or_else(|| {
            RagError::NotConfigured("an embedding provider is required".to_string())
        })?;
        let chunker = match self.chunker {
            Some(chunker) => chunker,
            None => Arc::new(RecursiveChunker::from_config(&config)?),
        };
        let index = self.index.unwrap_or_else(|| Arc::new(InMemoryVectorIndex::new()));

        Ok(LiveBackend {
            config,
            embedding_provider,
            index,
            chunker,
            language_model: self.language_model,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::document::Metadata;
    use crate::mock::{MockEmbeddingProvider, MockLlm};

    fn backend(llm: Option<Arc<MockLlm>>) -> LiveBackend {
        let mut builder = LiveBackend::builder()
            .config(RagConfig::default())
            .embedding_provider(Arc::new(MockEmbeddingProvider::new(64)));
        if let Some(llm) = llm {
            builder = builder.language_model(llm);
        }
        builder.build().unwrap()
    }

    #[test]
    fn builder_requires_embedding_provider() {
        let err = LiveBackend::builder().build().unwrap_err();
        assert!(matches!(err, RagError::NotConfigured(_)));
    }

    #[tokio::test]
    async fn answer_without_model_is_not_configured() {
        let backend = backend(None);
        let err = backend.answer("anything?", None, true).await.unwrap_err();
        assert!(matches!(err, RagError::NotConfigured(_)));
    }

    #[tokio::test]
    async fn explicit_context_skips_retrieval() {
        let llm = Arc::new(MockLlm::new("ok"));
        let backend = backend(Some(llm.clone()));
        backend.ingest(&[Document::new("indexed text", HashMap::new())]).await.unwrap();

        backend.answer("question?", Some("supplied context"), true).await.unwrap();
        let prompt = llm.last_prompt().unwrap();
        assert!(prompt.contains("Context:\nsupplied context\n"));
        assert!(!prompt.contains("indexed text"));
    }

    #[tokio::test]
    async fn empty_index_falls_back_to_general_knowledge() {
        let llm = Arc::new(MockLlm::new("from memory"));
        let backend = backend(Some(llm.clone()));

        let answer = backend.answer("Who wrote Hamlet?", None, true).await.unwrap();
        assert_eq!(answer, "from memory");
        assert!(llm.last_prompt().unwrap().contains("general knowledge"));
    }

    #[tokio::test]
    async fn summary_without_query_uses_insertion_order() {
        let llm = Arc::new(MockLlm::new("summary"));
        let backend = backend(Some(llm.clone()));
        backend
            .ingest(&[
                Document::new("first document", Metadata::new()),
                Document::new("second document", Metadata::new()),
            ])
            .await
            .unwrap();

        assert_eq!(backend.summarize(None).await.unwrap(), "summary");
        assert!(llm.last_prompt().unwrap().contains("first document\n\nsecond document"));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_model_times_out_as_generation_error() {
        struct Stalled;

        #[async_trait]
        impl LanguageModel for Stalled {
            fn name(&self) -> &str {
                "stalled"
            }

            async fn complete(&self, _request: &CompletionRequest) -> Result<String> {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok("late".to_string())
            }
        }

        let config = RagConfig::builder().request_timeout(Duration::from_secs(1)).build().unwrap();
        let backend = LiveBackend::builder()
            .config(config)
            .embedding_provider(Arc::new(MockEmbeddingProvider::new(8)))
            .language_model(Arc::new(Stalled))
            .build()
            .unwrap();

        let err = backend.answer("q", Some("ctx"), false).await.unwrap_err();
        assert!(
            matches!(err, RagError::GenerationError { ref provider, .. } if provider == "stalled")
        );
    }

    #[tokio::test]
    async fn empty_context_is_treated_as_absent() {
        let embedder = Arc::new(MockEmbeddingProvider::new(64));
        let llm = Arc::new(MockLlm::new("blue"));
        let backend = LiveBackend::builder()
            .embedding_provider(embedder.clone())
            .language_model(llm.clone())
            .build()
            .unwrap();
        backend
            .ingest(&[Document::new("The sky is blue. Grass is green.", Metadata::new())])
            .await
            .unwrap();

        backend.answer("What color is the sky?", Some(""), true).await.unwrap();
        let prompt = llm.last_prompt().unwrap();
        assert!(prompt.contains("Context:\nThe sky is blue. Grass is green.\n"));
        assert!(!prompt.contains("general knowledge"));
        assert_eq!(embedder.inputs().last().unwrap(), "What color is the sky?");
    }

    #[tokio::test]
    async fn answer_without_retrieval_uses_general_knowledge() {
        let embedder = Arc::new(MockEmbeddingProvider::new(64));
        let llm = Arc::new(MockLlm::new("from memory"));
        let backend = LiveBackend::builder()
            .embedding_provider(embedder.clone())
            .language_model(llm.clone())
            .build()
            .unwrap();
        backend.ingest(&[Document::new("indexed text", Metadata::new())]).await.unwrap();
        let embedded = embedder.inputs().len();

        let answer = backend.answer("Who wrote Hamlet?", None, false).await.unwrap();
        assert_eq!(answer, "from memory");
        assert_eq!(embedder.inputs().len(), embedded);

        let prompt = llm.last_prompt().unwrap();
        assert!(prompt.contains("general knowledge"));
        assert!(!prompt.contains("indexed text"));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_embedder_times_out_as_embedding_error() {
        struct StalledEmbedder;

        #[async_trait]
        impl EmbeddingProvider for StalledEmbedder {
            fn name(&self) -> &str {
                "stalled-embedder"
            }

            async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(vec![1.0; 8])
            }

            fn dimensions(&self) -> usize {
                8
            }
        }

        let config = RagConfig::builder().request_timeout(Duration::from_secs(1)).build().unwrap();
        let index: Arc<dyn VectorIndex> = Arc::new(InMemoryVectorIndex::new());
        let stalled = LiveBackend::builder()
            .config(config.clone())
            .embedding_provider(Arc::new(StalledEmbedder))
            .index(index.clone())
            .build()
            .unwrap();

        // Ingest: the whole batch is abandoned.
        let err = stalled.ingest(&[Document::new("some text", Metadata::new())]).await.unwrap_err();
        assert!(matches!(
            err,
            RagError::EmbeddingError { ref provider, .. } if provider == "stalled-embedder"
        ));
        assert_eq!(stalled.stats().await.chunk_count, 0);

        // Search: populate through a responsive embedder sharing the same index.
        let responsive = LiveBackend::builder()
            .config(config)
            .embedding_provider(Arc::new(MockEmbeddingProvider::new(8)))
            .index(index)
            .build()
            .unwrap();
        responsive.ingest(&[Document::new("some text", Metadata::new())]).await.unwrap();

        let err = stalled.search("text", 1).await.unwrap_err();
        assert!(matches!(err, RagError::EmbeddingError { .. }));
        assert_eq!(stalled.stats().await.chunk_count, 1);
    }
}
