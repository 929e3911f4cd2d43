//! In-memory vector index using cosine similarity.
//!
//! [`InMemoryVectorIndex`] keeps entries in insertion order inside a
//! `tokio::sync::RwLock`. Search is a brute-force scan, which is fine for
//! development, testing, and knowledge bases of a few thousand chunks.

use std::collections::HashSet;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::document::{Chunk, SearchResult};
use crate::error::{RagError, Result};
use crate::vectorstore::{IndexEntry, IndexStats, VectorIndex};

const BACKEND: &str = "InMemory";

#[derive(Debug)]
struct IndexState {
    dimensions: usize,
    entries: Vec<IndexEntry>,
}

/// An in-memory vector index using cosine similarity for search.
///
/// The index does not exist until the first insert and is dropped again by
/// [`reset`](VectorIndex::reset). All operations are async-safe via
/// `tokio::sync::RwLock`; each insert holds the write lock for the whole batch.
///
/// # Example
///
/// ```rust,ignore
/// use flowdesk_rag::{InMemoryVectorIndex, VectorIndex};
///
/// let index = InMemoryVectorIndex::new();
/// assert!(!index.stats().await.has_store);
/// ```
#[derive(Debug, Default)]
pub struct InMemoryVectorIndex {
    state: RwLock<Option<IndexState>>,
}

impl InMemoryVectorIndex {
    /// Create a new, uninitialized in-memory index.
    pub fn new() -> Self {
        Self::default()
    }
}

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 if either vector has zero magnitude.
pub(crate) fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

fn dimension_mismatch(expected: usize, actual: usize) -> RagError {
    RagError::VectorStoreError {
        backend: BACKEND.to_string(),
        message: format!("vector has {actual} dimensions, index expects {expected}"),
    }
}

#[async_trait]
impl VectorIndex for InMemoryVectorIndex {
    async fn insert(&self, entries: Vec<IndexEntry>) -> Result<()> {
        let Some(first) = entries.first() else {
            return Ok(());
        };

        let mut state = self.state.write().await;
        let dimensions = state.as_ref().map_or(first.vector.len(), |s| s.dimensions);
        if dimensions == 0 {
            return Err(RagError::VectorStoreError {
                backend: BACKEND.to_string(),
                message: "vectors must not be empty".to_string(),
            });
        }
        // Validate the whole batch before touching the index.
        if let Some(bad) = entries.iter().find(|e| e.vector.len() != dimensions) {
            return Err(dimension_mismatch(dimensions, bad.vector.len()));
        }

        let added = entries.len();
        let state =
            state.get_or_insert_with(|| IndexState { dimensions, entries: Vec::new() });
        state.entries.extend(entries);
        debug!(added, total = state.entries.len(), dimensions, "inserted index entries");
        Ok(())
    }

    async fn search(&self, vector: &[f32], top_k: usize) -> Result<Vec<SearchResult>> {
        let state = self.state.read().await;
        let state = match state.as_ref() {
            Some(state) if !state.entries.is_empty() => state,
            _ => return Err(RagError::EmptyIndex),
        };
        if vector.len() != state.dimensions {
            return Err(dimension_mismatch(state.dimensions, vector.len()));
        }

        let mut scored: Vec<SearchResult> = state
            .entries
            .iter()
            .map(|entry| SearchResult {
                chunk: entry.chunk.clone(),
                score: cosine_similarity(&entry.vector, vector),
            })
            .collect();

        // `sort_by` is stable, so equal scores keep insertion order.
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(top_k);
        Ok(scored)
    }

    async fn first_chunks(&self, limit: usize) -> Result<Vec<Chunk>> {
        let state = self.state.read().await;
        match state.as_ref() {
            Some(state) if !state.entries.is_empty() => {
                Ok(state.entries.iter().take(limit).map(|e| e.chunk.clone()).collect())
            }
            _ => Err(RagError::EmptyIndex),
        }
    }

    async fn reset(&self) {
        *self.state.write().await = None;
    }

    async fn len(&self) -> usize {
        self.state.read().await.as_ref().map_or(0, |s| s.entries.len())
    }

    async fn stats(&self) -> IndexStats {
        let state = self.state.read().await;
        match state.as_ref() {
            Some(state) => IndexStats {
                chunk_count: state.entries.len(),
                document_count: state
                    .entries
                    .iter()
                    .map(|e| e.chunk.parent_id.as_str())
                    .collect::<HashSet<_>>()
                    .len(),
                has_store: true,
                dimensions: Some(state.dimensions),
            },
            None => IndexStats::default(),
        }
    }
}
