//! Vector index trait for storing and searching chunk embeddings.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::document::{Chunk, SearchResult};
use crate::error::Result;

/// A [`Chunk`] together with its embedding vector.
///
/// Entries are owned by the index; callers only ever see the chunk again,
/// inside a [`SearchResult`].
#[derive(Debug, Clone, PartialEq)]
pub struct IndexEntry {
    /// The indexed chunk.
    pub chunk: Chunk,
    /// The chunk's embedding.
    pub vector: Vec<f32>,
}

impl IndexEntry {
    /// Pair a chunk with its embedding.
    pub fn new(chunk: Chunk, vector: Vec<f32>) -> Self {
        Self { chunk, vector }
    }
}

/// Point-in-time counters for a [`VectorIndex`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexStats {
    /// Number of indexed chunks.
    pub chunk_count: usize,
    /// Number of distinct source documents behind those chunks.
    pub document_count: usize,
    /// Whether the index has been initialized since creation or the last reset.
    pub has_store: bool,
    /// Vector dimensionality fixed by the first insert, if any.
    pub dimensions: Option<usize>,
}

/// A storage backend for chunk embeddings with similarity search.
///
/// Implementations must make each [`insert`](VectorIndex::insert) batch
/// visible atomically: a concurrent search sees either none or all of it.
///
/// # Example
///
/// ```rust,ignore
/// use flowdesk_rag::{IndexEntry, InMemoryVectorIndex, VectorIndex};
///
/// let index = InMemoryVectorIndex::new();
/// index.insert(vec![IndexEntry::new(chunk, embedding)]).await?;
/// let results = index.search(&query_embedding, 5).await?;
/// ```
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Append entries. The index is created by the first non-empty batch.
    ///
    /// Every vector must share the index's dimensionality.
    async fn insert(&self, entries: Vec<IndexEntry>) -> Result<()>;

    /// Return the `top_k` entries most similar to `vector`.
    ///
    /// Results are ordered by descending score; equal scores keep insertion
    /// order. Fails with [`RagError::EmptyIndex`](crate::RagError::EmptyIndex)
    /// when nothing has been inserted.
    async fn search(&self, vector: &[f32], top_k: usize) -> Result<Vec<SearchResult>>;

    /// Return up to `limit` chunks in insertion order, without scoring.
    ///
    /// Fails with [`RagError::EmptyIndex`](crate::RagError::EmptyIndex) when
    /// nothing has been inserted.
    async fn first_chunks(&self, limit: usize) -> Result<Vec<Chunk>>;

    /// Discard every entry and the index itself.
    async fn reset(&self);

    /// Report counters for the current index.
    async fn stats(&self) -> IndexStats;

    /// Number of indexed entries.
    async fn len(&self) -> usize;

    /// Whether nothing is indexed.
    async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
