//! Conversational assistant with buffered memory and specialized presets.
//!
//! A [`ChatAgent`] keeps every exchange in a [`Conversation`] and renders the
//! full memory into its preset's prompt on each turn.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::conversation::{Conversation, render_history, render_history_as};
use crate::error::{RagError, Result};
use crate::generation::{CompletionRequest, FixtureModel, LanguageModel};
use crate::prompt::PromptTemplate;

/// The closed set of assistant personas.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AgentPreset {
    /// General platform assistant.
    #[default]
    General,
    /// Statistics, visualization and data quality.
    DataAnalyst,
    /// Code generation, debugging and review.
    CodeAssistant,
    /// Summarization, extraction and classification of documents.
    DocumentProcessor,
    /// Model architecture, tuning and deployment.
    MlEngineer,
}

impl AgentPreset {
    /// Every preset, in declaration order.
    pub const ALL: [AgentPreset; 5] = [
        AgentPreset::General,
        AgentPreset::DataAnalyst,
        AgentPreset::CodeAssistant,
        AgentPreset::DocumentProcessor,
        AgentPreset::MlEngineer,
    ];

    /// The kebab-case name.
    pub fn as_str(self) -> &'static str {
        match self {
            AgentPreset::General => "general",
            AgentPreset::DataAnalyst => "data-analyst",
            AgentPreset::CodeAssistant => "code-assistant",
            AgentPreset::DocumentProcessor => "document-processor",
            AgentPreset::MlEngineer => "ml-engineer",
        }
    }

    /// The label the assistant speaks under in the prompt.
    pub fn ai_label(self) -> &'static str {
        match self {
            AgentPreset::General => "AI",
            AgentPreset::DataAnalyst => "Data Analyst AI",
            AgentPreset::CodeAssistant => "Code Assistant AI",
            AgentPreset::DocumentProcessor => "Document Processor AI",
            AgentPreset::MlEngineer => "ML Engineer AI",
        }
    }

    /// The system prompt, with `{history}` and `{input}` placeholders.
    pub fn template(self) -> PromptTemplate {
        match self {
            AgentPreset::General => PromptTemplate::new(
                "agent_general",
                "\
You are an intelligent AI assistant integrated into a comprehensive AI/ML platform.
You have access to various AI capabilities including:
- Document analysis and processing
- Data preprocessing and analysis
- Machine learning model insights
- Code generation and optimization
- Workflow automation

Current conversation:
{history}
Human: {input}
AI:",
            ),
            AgentPreset::DataAnalyst => PromptTemplate::new(
                "agent_data_analyst",
                "\
You are a specialized Data Analysis AI Agent. Your expertise includes:
- Statistical analysis and interpretation
- Data visualization recommendations
- Pattern recognition in datasets
- Predictive modeling suggestions
- Data quality assessment

Current conversation:
{history}
Human: {input}
Data Analyst AI:",
            ),
            AgentPreset::CodeAssistant => PromptTemplate::new(
                "agent_code_assistant",
                "\
You are a specialized Code Assistant AI Agent. Your expertise includes:
- Code generation and optimization
- Debugging and error resolution
- Best practices recommendations
- API integration guidance
- Framework-specific solutions

Current conversation:
{history}
Human: {input}
Code Assistant AI:",
            ),
            AgentPreset::DocumentProcessor => PromptTemplate::new(
                "agent_document_processor",
                "\
You are a specialized Document Processing AI Agent. Your expertise includes:
- Document analysis and summarization
- Information extraction
- Content classification
- Text preprocessing
- Document comparison and analysis

Current conversation:
{history}
Human: {input}
Document Processor AI:",
            ),
            AgentPreset::MlEngineer => PromptTemplate::new(
                "agent_ml_engineer",
                "\
You are a specialized ML Engineering AI Agent. Your expertise includes:
- Model architecture recommendations
- Hyperparameter tuning strategies
- Model deployment and monitoring
- Feature engineering
- Performance optimization

Current conversation:
{history}
Human: {input}
ML Engineer AI:",
            ),
        }
    }
}

impl fmt::Display for AgentPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AgentPreset {
    type Err = RagError;

    fn from_str(s: &str) -> Result<Self> {
        AgentPreset::ALL
            .into_iter()
            .find(|preset| preset.as_str() == s)
            .ok_or_else(|| RagError::ConfigError(format!("unknown agent preset: {s}")))
    }
}

/// A conversational assistant remembering every exchange.
pub struct ChatAgent {
    preset: AgentPreset,
    model: Arc<dyn LanguageModel>,
    memory: Conversation,
}

impl fmt::Debug for ChatAgent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatAgent")
            .field("preset", &self.preset)
            .field("model", &self.model.name())
            .field("memory", &self.memory.len())
            .finish()
    }
}

impl ChatAgent {
    /// Create an agent for `preset` backed by `model`.
    pub fn new(preset: AgentPreset, model: Arc<dyn LanguageModel>) -> Self {
        Self { preset, model, memory: Conversation::new() }
    }

    /// Create an agent answering from canned replies.
    pub fn fixture(preset: AgentPreset) -> Self {
        Self::new(preset, Arc::new(FixtureModel::assistant()))
    }

    /// Create an agent from the environment.
    ///
    /// Uses the OpenAI chat model when `OPENAI_API_KEY` holds a usable key,
    /// otherwise canned replies.
    pub fn from_env(preset: AgentPreset) -> Self {
        #[cfg(feature = "openai")]
        {
            use crate::openai::{AGENT_TEMPERATURE, OpenAIChatModel, OpenAISettings};

            if let Some(settings) = OpenAISettings::from_env() {
                let model = OpenAIChatModel::new(settings, AGENT_TEMPERATURE);
                return Self::new(preset, Arc::new(model));
            }
        }

        warn!(preset = %preset, "OpenAI API key not configured, agent running in fixture mode");
        Self::fixture(preset)
    }

    /// The active preset.
    pub fn preset(&self) -> AgentPreset {
        self.preset
    }

    /// Every exchange so far.
    pub fn memory(&self) -> &Conversation {
        &self.memory
    }

    /// The memory as `Human: ...\nAI: ...` lines.
    pub fn memory_text(&self) -> String {
        render_history(self.memory.exchanges())
    }

    /// Forget every exchange.
    pub fn clear_memory(&mut self) {
        self.memory.clear();
    }

    /// Send `input` and return the reply. The exchange is remembered only on success.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if `input` is blank and propagates
    /// model failures.
    pub async fn chat(&mut self, input: &str) -> Result<String> {
        if input.trim().is_empty() {
            return Err(RagError::config("message must not be empty"));
        }

        let history = render_history_as(self.memory.exchanges(), self.preset.ai_label());
        let prompt = self.preset.template().render(&[("history", &history), ("input", input)]);
        debug!(preset = %self.preset, memory = self.memory.len(), "agent turn");

        let reply = self
            .model
            .complete(&CompletionRequest::new(prompt, input))
            .await
            .inspect_err(|e| error!(preset = %self.preset, error = %e, "agent turn failed"))?;

        self.memory.record(input, reply.clone());
        Ok(reply)
    }
}
