//! # flowdesk-rag
//!
//! In-memory retrieval-augmented generation with conversational context.
//!
//! ## Overview
//!
//! Documents are split into overlapping chunks, embedded, and kept in an
//! in-memory vector index. Questions are answered by retrieving the most
//! similar chunks and handing them to a language model, optionally in the
//! light of the recent conversation.
//!
//! - [`RagService`] - the public entry point (add, search, answer, converse, summarize)
//! - [`LiveBackend`] - chunk, embed, index, retrieve, generate
//! - [`FixtureBackend`] - seed knowledge base and canned replies for offline use
//! - [`ChatAgent`] - a conversational assistant with [`AgentPreset`] personas
//! - [`MockEmbeddingProvider`] / [`MockLlm`] - deterministic collaborators for tests
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use flowdesk_rag::{LiveBackend, RagConfig, RagService};
//!
//! let backend = LiveBackend::builder()
//!     .config(RagConfig::default())
//!     .embedding_provider(Arc::new(embedder))
//!     .language_model(Arc::new(model))
//!     .build()?;
//! let service = RagService::new(Arc::new(backend));
//!
//! service.add_document("The sky is blue.", Default::default()).await?;
//! let answer = service.generate_answer("What color is the sky?", None, true).await?;
//! ```
//!
//! Without credentials, [`RagService::from_env`] returns a fixture-mode service.
//!
//! ## Features
//!
//! - `openai` - OpenAI embeddings and chat completions over `reqwest`

pub mod agent;
pub mod backend;
pub mod chunking;
pub mod config;
pub mod conversation;
pub mod document;
pub mod embedding;
pub mod error;
pub mod fixture;
pub mod generation;
pub mod inmemory;
pub mod mock;
pub mod pipeline;
pub mod prompt;
pub mod service;
pub mod vectorstore;

#[cfg(feature = "openai")]
pub mod openai;

pub use agent::{AgentPreset, ChatAgent};
pub use backend::{ConversationalAnswer, RagBackend, RagStats};
pub use chunking::{Chunker, RecursiveChunker, TextSplitter, split_text};
pub use config::{RagConfig, RagConfigBuilder};
pub use conversation::{Conversation, ConversationExchange, ConversationState};
pub use document::{Chunk, Document, DocumentInput, Metadata, SearchResult};
pub use embedding::EmbeddingProvider;
pub use error::{RagError, Result};
pub use fixture::FixtureBackend;
pub use generation::{CompletionRequest, FixtureModel, LanguageModel};
pub use inmemory::InMemoryVectorIndex;
pub use mock::{MockEmbeddingProvider, MockLlm};
pub use pipeline::{LiveBackend, LiveBackendBuilder};
pub use prompt::PromptTemplate;
pub use service::RagService;
pub use vectorstore::{IndexEntry, IndexStats, VectorIndex};
