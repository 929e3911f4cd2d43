//! Deterministic in-process collaborators for tests and offline demos.
//!
//! [`MockEmbeddingProvider`] hashes words into a fixed number of buckets, so
//! texts sharing words get similar vectors. [`MockLlm`] returns a scripted
//! reply and records every request it receives.

use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;

use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::generation::{CompletionRequest, LanguageModel};

/// A bag-of-words embedding provider using feature hashing.
///
/// Each lowercase alphanumeric word adds 1.0 to bucket `fnv1a(word) % dimensions`.
#[derive(Debug)]
pub struct MockEmbeddingProvider {
    dimensions: usize,
    fail_with: Option<String>,
    inputs: Mutex<Vec<String>>,
}

impl MockEmbeddingProvider {
    /// Create a provider producing vectors of `dimensions` buckets (at least one).
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions: dimensions.max(1), fail_with: None, inputs: Mutex::new(Vec::new()) }
    }

    /// Make every call fail with `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self { fail_with: Some(message.into()), ..Self::new(8) }
    }

    /// Every text passed to `embed`/`embed_batch`, in call order.
    pub fn inputs(&self) -> Vec<String> {
        self.inputs.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

fn fnv1a(word: &str) -> u64 {
    word.bytes()
        .fold(0xcbf2_9ce4_8422_2325, |hash, b| (hash ^ u64::from(b)).wrapping_mul(0x100_0000_01b3))
}

#[async_trait]
impl EmbeddingProvider for MockEmbeddingProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.inputs.lock().unwrap_or_else(PoisonError::into_inner).push(text.to_string());
        if let Some(message) = &self.fail_with {
            return Err(RagError::EmbeddingError {
                provider: "mock".into(),
                message: message.clone(),
            });
        }

        let mut vector = vec![0.0f32; self.dimensions];
        for word in text.split(|c: char| !c.is_alphanumeric()).filter(|w| !w.is_empty()) {
            let bucket = (fnv1a(&word.to_lowercase()) % self.dimensions as u64) as usize;
            vector[bucket] += 1.0;
        }
        Ok(vector)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

/// A [`LanguageModel`] returning a fixed reply.
#[derive(Debug)]
pub struct MockLlm {
    reply: std::result::Result<String, String>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl MockLlm {
    /// Always answer with `reply`.
    pub fn new(reply: impl Into<String>) -> Self {
        Self { reply: Ok(reply.into()), requests: Mutex::new(Vec::new()) }
    }

    /// Fail every call with a generation error carrying `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self { reply: Err(message.into()), requests: Mutex::new(Vec::new()) }
    }

    /// Every request received, in call order.
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// The prompt of the most recent request.
    pub fn last_prompt(&self) -> Option<String> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .map(|r| r.prompt.clone())
    }
}

#[async_trait]
impl LanguageModel for MockLlm {
    fn name(&self) -> &str {
        "mock-llm"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        self.requests.lock().unwrap_or_else(PoisonError::into_inner).push(request.clone());
        self.reply.clone().map_err(|message| RagError::GenerationError {
            provider: "mock-llm".into(),
            message,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inmemory::cosine_similarity;

    #[tokio::test]
    async fn shared_words_give_positive_similarity() {
        let provider = MockEmbeddingProvider::new(64);
        let doc = provider.embed("The sky is blue. Grass is green.").await.unwrap();
        let query = provider.embed("sky color").await.unwrap();
        assert!(cosine_similarity(&doc, &query) > 0.0);
        assert_eq!(provider.inputs().len(), 2);
    }

    #[tokio::test]
    async fn embeddings_are_case_insensitive() {
        let provider = MockEmbeddingProvider::new(32);
        assert_eq!(provider.embed("Sky").await.unwrap(), provider.embed("sky").await.unwrap());
    }

    #[tokio::test]
    async fn failing_llm_reports_generation_error() {
        let llm = MockLlm::failing("rate limited");
        let err = llm.complete(&CompletionRequest::new("p", "q")).await.unwrap_err();
        assert!(matches!(err, RagError::GenerationError { .. }));
        assert_eq!(llm.requests().len(), 1);
    }
}
