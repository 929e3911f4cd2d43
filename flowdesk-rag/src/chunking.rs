//! Document chunking.
//!
//! [`TextSplitter`] cuts text into overlapping windows, preferring paragraph
//! breaks, then sentence ends, then whitespace, and falling back to a hard cut
//! only when the window has no better boundary. Sizes are counted in
//! characters, so multi-byte text is never split inside a code point.
//!
//! Consecutive chunks always share exactly `chunk_overlap` characters, so
//! dropping that prefix from every chunk after the first reassembles the
//! original text.

use crate::config::RagConfig;
use crate::document::{Chunk, Document};
use crate::error::{RagError, Result};

/// A strategy for splitting documents into chunks.
///
/// Implementations produce [`Chunk`]s stamped with the parent document's
/// metadata. Embeddings are attached later by the index.
pub trait Chunker: Send + Sync {
    /// Split a document into chunks.
    ///
    /// Returns an empty `Vec` if the document has empty content.
    fn chunk(&self, document: &Document) -> Vec<Chunk>;
}

/// Split `content` into chunks of at most `max_chunk_size` characters sharing
/// `overlap` characters with their neighbour.
///
/// # Errors
///
/// Returns [`RagError::ConfigError`] if `overlap >= max_chunk_size`.
///
/// # Example
///
/// ```rust
/// use flowdesk_rag::chunking::split_text;
///
/// let chunks: Vec<&str> = split_text("abcdefghij", 4, 1)?.collect();
/// assert_eq!(chunks, ["abcd", "defg", "ghij"]);
/// # Ok::<(), flowdesk_rag::RagError>(())
/// ```
pub fn split_text(content: &str, max_chunk_size: usize, overlap: usize) -> Result<SplitText<'_>> {
    Ok(TextSplitter::new(max_chunk_size, overlap)?.split(content))
}

/// Validated splitting parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl TextSplitter {
    /// Create a splitter.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if `chunk_overlap >= chunk_size`.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        if chunk_overlap >= chunk_size {
            return Err(RagError::ConfigError(format!(
                "chunk_overlap ({chunk_overlap}) must be less than chunk_size ({chunk_size})"
            )));
        }
        Ok(Self { chunk_size, chunk_overlap })
    }

    /// Create a splitter from the chunking fields of a [`RagConfig`].
    pub fn from_config(config: &RagConfig) -> Result<Self> {
        Self::new(config.chunk_size, config.chunk_overlap)
    }

    /// Maximum chunk length in characters.
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Characters shared by consecutive chunks.
    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    /// Lazily split `text`.
    pub fn split<'a>(&self, text: &'a str) -> SplitText<'a> {
        let offsets =
            text.char_indices().map(|(i, _)| i).chain(std::iter::once(text.len())).collect();
        SplitText {
            text,
            offsets,
            chunk_size: self.chunk_size,
            overlap: self.chunk_overlap,
            next_start: Some(0),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Boundary {
    Paragraph,
    Sentence,
    Whitespace,
}

/// Iterator over the chunks of one text. Produced by [`TextSplitter::split`].
#[derive(Debug)]
pub struct SplitText<'a> {
    text: &'a str,
    /// Byte offset of every character boundary, ending with `text.len()`.
    offsets: Vec<usize>,
    chunk_size: usize,
    overlap: usize,
    /// Character position of the next chunk, `None` once exhausted.
    next_start: Option<usize>,
}

impl<'a> SplitText<'a> {
    fn char_len(&self) -> usize {
        self.offsets.len() - 1
    }

    fn slice(&self, start: usize, end: usize) -> &'a str {
        &self.text[self.offsets[start]..self.offsets[end]]
    }

    /// Pick the end of the chunk starting at `start`.
    ///
    /// The cut keeps more than `overlap` characters so the next chunk starts
    /// strictly after this one.
    fn find_cut(&self, start: usize) -> usize {
        let limit = start + self.chunk_size;
        let floor = start + self.overlap + 1;
        [Boundary::Paragraph, Boundary::Sentence, Boundary::Whitespace]
            .into_iter()
            .find_map(|boundary| (floor..=limit).rev().find(|&pos| self.is_boundary(pos, boundary)))
            .unwrap_or(limit)
    }

    fn is_boundary(&self, pos: usize, boundary: Boundary) -> bool {
        let before = &self.text[..self.offsets[pos]];
        let mut tail = before.chars().rev();
        match boundary {
            Boundary::Paragraph => before.ends_with("\n\n"),
            Boundary::Sentence => matches!(
                (tail.next(), tail.next()),
                (Some(space), Some('.' | '!' | '?')) if space.is_whitespace()
            ),
            Boundary::Whitespace => tail.next().is_some_and(char::is_whitespace),
        }
    }
}

impl<'a> Iterator for SplitText<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        let start = self.next_start?;
        let total = self.char_len();

        if total - start <= self.chunk_size {
            self.next_start = None;
            return (start < total).then(|| self.slice(start, total));
        }

        let end = self.find_cut(start);
        self.next_start = Some(end - self.overlap);
        Some(self.slice(start, end))
    }
}

impl std::iter::FusedIterator for SplitText<'_> {}

/// Splits documents with a [`TextSplitter`]: paragraphs, then sentences, then
/// words, then characters.
///
/// Each chunk inherits the parent document's metadata plus `docId` and
/// `chunkIndex`.
///
/// # Example
///
/// ```rust,ignore
/// use flowdesk_rag::RecursiveChunker;
///
/// let chunker = RecursiveChunker::new(1000, 200)?;
/// let chunks = chunker.chunk(&document);
/// ```
#[derive(Debug, Clone)]
pub struct RecursiveChunker {
    splitter: TextSplitter,
}

impl RecursiveChunker {
    /// Create a new `RecursiveChunker`.
    ///
    /// # Arguments
    ///
    /// * `chunk_size` - maximum number of characters per chunk
    /// * `chunk_overlap` - number of overlapping characters between consecutive chunks
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        Ok(Self { splitter: TextSplitter::new(chunk_size, chunk_overlap)? })
    }

    /// Create a chunker from the chunking fields of a [`RagConfig`].
    pub fn from_config(config: &RagConfig) -> Result<Self> {
        Ok(Self { splitter: TextSplitter::from_config(config)? })
    }
}

impl Chunker for RecursiveChunker {
    fn chunk(&self, document: &Document) -> Vec<Chunk> {
        self.splitter
            .split(&document.content)
            .enumerate()
            .map(|(i, text)| Chunk::new(text, document, i))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::document::Metadata;

    fn split(text: &str, size: usize, overlap: usize) -> Vec<&str> {
        split_text(text, size, overlap).unwrap().collect()
    }

    #[test]
    fn empty_content_yields_no_chunks() {
        assert!(split("", 10, 2).is_empty());
    }

    #[test]
    fn short_content_yields_single_chunk() {
        let text = "The sky is blue. Grass is green.";
        assert_eq!(split(text, 1000, 200), [text]);
        assert_eq!(split(text, text.chars().count(), 5), [text]);
    }

    #[test]
    fn overlap_not_less_than_size_is_rejected() {
        assert!(matches!(split_text("abc", 10, 10), Err(RagError::ConfigError(_))));
        assert!(matches!(split_text("abc", 0, 0), Err(RagError::ConfigError(_))));
    }

    #[test]
    fn hard_cut_without_boundaries() {
        assert_eq!(split("abcdefghij", 4, 1), ["abcd", "defg", "ghij"]);
    }

    #[test]
    fn prefers_paragraph_break() {
        let text = "First paragraph here.\n\nSecond paragraph follows.";
        let chunks = split(text, 30, 5);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0], "First paragraph here.\n\n");
        assert_eq!(chunks[1], "re.\n\nSecond paragraph follows.");
    }

    #[test]
    fn prefers_sentence_end_over_whitespace() {
        let chunks = split("One two three. Four five six seven", 20, 3);
        assert_eq!(chunks[0], "One two three. ");
        assert_eq!(chunks[1], "e. Four five six ");
        assert_eq!(chunks[2], "ix seven");
    }

    #[test]
    fn counts_characters_not_bytes() {
        assert_eq!(split("ééééé", 2, 0), ["éé", "éé", "é"]);
    }

    #[test]
    fn chunker_stamps_metadata() {
        let chunker = RecursiveChunker::new(4, 1).unwrap();
        let doc = Document::new("abcdefghij", Metadata::from([("source".into(), json!("test"))]));
        let chunks = chunker.chunk(&doc);
        assert_eq!(chunks.len(), 3);
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.index, i);
            assert_eq!(chunk.parent_id, doc.id);
            assert_eq!(chunk.metadata["chunkIndex"], json!(i));
            assert_eq!(chunk.metadata["source"], json!("test"));
        }
    }
}
