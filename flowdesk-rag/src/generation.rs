//! Language model seam and the fixture model used when no credential is set.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::prompt::PromptTemplate;

/// One completion call: the fully rendered prompt plus the raw user text.
///
/// Live models send only [`prompt`](CompletionRequest::prompt). Fixture
/// models pick a canned reply from [`input`](CompletionRequest::input).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// The rendered prompt.
    pub prompt: String,
    /// The user's question or message, before templating.
    pub input: String,
}

impl CompletionRequest {
    /// Create a request.
    pub fn new(prompt: impl Into<String>, input: impl Into<String>) -> Self {
        Self { prompt: prompt.into(), input: input.into() }
    }
}

/// A text generation backend.
///
/// Implementations return the model's raw output; callers never post-process
/// it. Failures are reported as
/// [`RagError::GenerationError`](crate::RagError::GenerationError).
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Model name used in errors and logs.
    fn name(&self) -> &str;

    /// Generate a completion for `request`.
    async fn complete(&self, request: &CompletionRequest) -> Result<String>;
}

/// A [`LanguageModel`] that answers from a keyword table instead of a network
/// service.
///
/// Keywords are matched as whole lowercase words against the request input,
/// in table order; the first hit wins. Inputs that match nothing get the
/// fallback template rendered with `{input}`.
///
/// # Example
///
/// ```rust
/// use flowdesk_rag::FixtureModel;
///
/// let model = FixtureModel::knowledge_base();
/// assert!(model.reply("What is RAG?").starts_with("RAG (Retrieval-Augmented Generation)"));
/// ```
#[derive(Debug, Clone)]
pub struct FixtureModel {
    name: &'static str,
    replies: Vec<(&'static str, &'static str)>,
    fallback: PromptTemplate,
}

impl FixtureModel {
    /// Create a fixture model from a keyword table and a fallback template.
    pub fn new(
        name: &'static str,
        replies: Vec<(&'static str, &'static str)>,
        fallback: PromptTemplate,
    ) -> Self {
        Self { name, replies, fallback }
    }

    /// Canned answers about the platform's knowledge base.
    pub fn knowledge_base() -> Self {
        Self::new(
            "fixture-knowledge-base",
            vec![
                (
                    "what is rag",
                    "RAG (Retrieval-Augmented Generation) pairs information retrieval with text \
                     generation. Relevant documents are looked up in a knowledge base first, and \
                     the answer is then generated from what was found, which keeps it accurate \
                     and grounded.",
                ),
                (
                    "how does machine learning work",
                    "Machine learning trains algorithms on example data so they learn patterns \
                     and can make predictions on new inputs. On this platform models can run \
                     client-side for real-time inference without a server round trip.",
                ),
                (
                    "what is flowise",
                    "Flowise is a visual builder for AI workflows. Pipelines are assembled by \
                     connecting nodes in a drag-and-drop editor instead of writing glue code.",
                ),
                (
                    "authentication",
                    "The platform supports OAuth 2.0, single sign-on and guest access, with \
                     token validation and session management at every layer.",
                ),
            ],
            PromptTemplate::new(
                "fixture_knowledge_base_fallback",
                "\
From the available knowledge base, here is what I can say about: {input}

The AI/ML Flowise Platform brings together retrieval-augmented generation, machine learning \
models and visual workflow builders for building complete AI applications with modern \
security and scalability.

It covers use cases from data analysis to workflow automation. Which aspect would you like \
to explore further?",
            ),
        )
    }

    /// Canned replies for the conversational assistant.
    pub fn assistant() -> Self {
        Self::new(
            "fixture-assistant",
            vec![
                ("hi", "Hello! How can I help with your AI/ML project today?"),
                ("hello", "Hi there, welcome to the AI/ML platform. What would you like to work on?"),
                (
                    "help",
                    "I can help with code analysis, data insights, document processing, ML \
                     recommendations and workflow automation. Where would you like to start?",
                ),
                (
                    "code",
                    "I can review, optimize and debug code, suggest algorithms and explain \
                     tricky sections. Paste the code you are working on.",
                ),
                (
                    "data",
                    "I can help with data exploration, preprocessing, visualization, statistics \
                     and feature engineering. What data are you working with?",
                ),
                (
                    "machine learning",
                    "Happy to help with model selection, hyperparameter tuning, feature \
                     engineering, evaluation and deployment. What is the ML problem?",
                ),
                (
                    "error",
                    "Let's debug it. Share the full error message and I will check the \
                     dependencies and logic with you and suggest a fix.",
                ),
                (
                    "optimize",
                    "I can look at algorithmic efficiency, code structure, resource usage and \
                     caching. What needs to be faster?",
                ),
                (
                    "recommend",
                    "I can recommend tools, libraries, architecture patterns and learning \
                     resources. Which area are you interested in?",
                ),
            ],
            PromptTemplate::new(
                "fixture_assistant_fallback",
                "\
That's an interesting question about \"{input}\". I can help with technical analysis, \
solution design, code review and learning support for your AI/ML work. What are you trying \
to accomplish?",
            ),
        )
    }

    /// Return the canned reply for `input`.
    pub fn reply(&self, input: &str) -> String {
        let words = lowercase_words(input);
        self.replies
            .iter()
            .find(|(keyword, _)| contains_phrase(&words, keyword))
            .map(|(_, reply)| (*reply).to_string())
            .unwrap_or_else(|| self.fallback.render(&[("input", input)]))
    }
}

fn lowercase_words(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

fn contains_phrase(words: &[String], phrase: &str) -> bool {
    let needle: Vec<&str> = phrase.split_whitespace().collect();
    !needle.is_empty()
        && words.windows(needle.len()).any(|window| window.iter().zip(&needle).all(|(w, n)| w == n))
}

#[async_trait]
impl LanguageModel for FixtureModel {
    fn name(&self) -> &str {
        self.name
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        debug!(model = self.name, input_len = request.input.len(), "fixture completion");
        Ok(self.reply(&request.input))
    }
}
