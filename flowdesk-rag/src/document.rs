//! Data types for documents, chunks, and search results.

use std::collections::HashMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Caller-supplied metadata attached to a document and inherited by its chunks.
pub type Metadata = HashMap<String, Value>;

/// Metadata key holding the parent document ID on every chunk.
pub const DOC_ID_KEY: &str = "docId";

/// Metadata key holding the chunk position on every chunk.
pub const CHUNK_INDEX_KEY: &str = "chunkIndex";

/// A source document containing text content and metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    /// Unique identifier, assigned at ingestion.
    pub id: String,
    /// The full text content of the document.
    pub content: String,
    /// Key-value metadata set by the caller.
    pub metadata: Metadata,
}

impl Document {
    /// Create a document with a freshly generated ID.
    pub fn new(content: impl Into<String>, metadata: Metadata) -> Self {
        Self { id: new_document_id(), content: content.into(), metadata }
    }

    /// The `title` metadata field, if it is a string.
    pub fn title(&self) -> Option<&str> {
        self.metadata.get("title").and_then(Value::as_str)
    }
}

/// The caller's half of a [`Document`]: content and metadata, no ID yet.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DocumentInput {
    /// The text to ingest.
    pub content: String,
    /// Metadata to attach to the document.
    #[serde(default)]
    pub metadata: Metadata,
}

impl DocumentInput {
    /// Create an input from content and metadata.
    pub fn new(content: impl Into<String>, metadata: Metadata) -> Self {
        Self { content: content.into(), metadata }
    }
}

/// A contiguous slice of a [`Document`], the unit of embedding and retrieval.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    /// The text content of the chunk.
    pub text: String,
    /// The ID of the parent [`Document`].
    pub parent_id: String,
    /// Position of this chunk in its parent's split sequence.
    pub index: usize,
    /// The parent's metadata plus `docId` and `chunkIndex`.
    pub metadata: Metadata,
}

impl Chunk {
    /// Create a chunk stamped with its parent's metadata, `docId` and `chunkIndex`.
    pub fn new(text: impl Into<String>, document: &Document, index: usize) -> Self {
        let mut metadata = document.metadata.clone();
        metadata.insert(DOC_ID_KEY.to_string(), Value::String(document.id.clone()));
        metadata.insert(CHUNK_INDEX_KEY.to_string(), Value::from(index));
        Self { text: text.into(), parent_id: document.id.clone(), index, metadata }
    }
}

/// A retrieved [`Chunk`] paired with a relevance score.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchResult {
    /// The retrieved chunk.
    pub chunk: Chunk,
    /// The similarity score (higher is more relevant).
    pub score: f32,
}

/// Generate a document ID of the form `doc-{unix_millis}-{9 base36 chars}`.
pub fn new_document_id() -> String {
    const ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let mut bits = Uuid::new_v4().as_u128();
    let suffix: String = (0..9)
        .map(|_| {
            let c = ALPHABET[(bits % 36) as usize] as char;
            bits /= 36;
            c
        })
        .collect();
    format!("doc-{}-{suffix}", Utc::now().timestamp_millis())
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use serde_json::json;

    use super::*;

    #[test]
    fn document_ids_are_unique() {
        let ids: HashSet<String> = (0..1000).map(|_| new_document_id()).collect();
        assert_eq!(ids.len(), 1000);
        assert!(ids.iter().all(|id| id.starts_with("doc-")));
    }

    #[test]
    fn chunk_inherits_metadata_and_stamps_position() {
        let doc = Document::new(
            "body",
            Metadata::from([("source".to_string(), json!("wiki"))]),
        );
        let chunk = Chunk::new("bo", &doc, 2);
        assert_eq!(chunk.parent_id, doc.id);
        assert_eq!(chunk.metadata["source"], json!("wiki"));
        assert_eq!(chunk.metadata[DOC_ID_KEY], json!(doc.id));
        assert_eq!(chunk.metadata[CHUNK_INDEX_KEY], json!(2));
    }

    #[test]
    fn input_metadata_defaults_to_empty() {
        let input: DocumentInput = serde_json::from_str(r#"{"content": "hello"}"#).unwrap();
        assert!(input.metadata.is_empty());
    }
}
