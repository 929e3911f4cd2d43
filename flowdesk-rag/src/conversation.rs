//! Per-caller conversation state.
//!
//! A [`Conversation`] is an ordered list of question/answer exchanges. It is
//! `Idle` until the first successful turn and `Active` afterwards. Only the most
//! recent exchanges (the history window) are used to contextualize the next
//! turn; older exchanges are kept but not sent anywhere.

use serde::{Deserialize, Serialize};

/// One question/answer pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationExchange {
    /// What the user asked.
    pub human: String,
    /// What the assistant answered.
    pub ai: String,
}

impl ConversationExchange {
    /// Create an exchange.
    pub fn new(human: impl Into<String>, ai: impl Into<String>) -> Self {
        Self { human: human.into(), ai: ai.into() }
    }
}

/// Whether any exchange has been recorded yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationState {
    /// No exchanges yet.
    Idle,
    /// At least one exchange recorded.
    Active,
}

/// An ordered sequence of exchanges belonging to one caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    exchanges: Vec<ConversationExchange>,
}

impl Conversation {
    /// Start an idle conversation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resume a conversation from previously recorded exchanges.
    pub fn from_exchanges(exchanges: Vec<ConversationExchange>) -> Self {
        Self { exchanges }
    }

    /// Current state.
    pub fn state(&self) -> ConversationState {
        if self.exchanges.is_empty() { ConversationState::Idle } else { ConversationState::Active }
    }

    /// All exchanges in conversational order.
    pub fn exchanges(&self) -> &[ConversationExchange] {
        &self.exchanges
    }

    /// Number of recorded exchanges.
    pub fn len(&self) -> usize {
        self.exchanges.len()
    }

    /// Whether no exchange has been recorded.
    pub fn is_empty(&self) -> bool {
        self.exchanges.is_empty()
    }

    /// The last `window` exchanges (fewer if the conversation is shorter).
    pub fn recent(&self, window: usize) -> &[ConversationExchange] {
        recent(&self.exchanges, window)
    }

    /// Append one exchange.
    pub fn record(&mut self, human: impl Into<String>, ai: impl Into<String>) {
        self.exchanges.push(ConversationExchange::new(human, ai));
    }

    /// Forget every exchange, returning to `Idle`.
    pub fn clear(&mut self) {
        self.exchanges.clear();
    }
}

/// The last `window` entries of `history`.
pub fn recent(history: &[ConversationExchange], window: usize) -> &[ConversationExchange] {
    &history[history.len().saturating_sub(window)..]
}

/// Serialize exchanges as `Human: ...\nAI: ...` blocks joined by newlines.
pub fn render_history(exchanges: &[ConversationExchange]) -> String {
    render_history_as(exchanges, "AI")
}

/// Like [`render_history`] with a custom label for the assistant's lines.
pub fn render_history_as(exchanges: &[ConversationExchange], ai_label: &str) -> String {
    exchanges
        .iter()
        .map(|e| format!("Human: {}\n{ai_label}: {}", e.human, e.ai))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_follows_recorded_exchanges() {
        let mut conversation = Conversation::new();
        assert_eq!(conversation.state(), ConversationState::Idle);
        conversation.record("hi", "hello");
        assert_eq!(conversation.state(), ConversationState::Active);
        conversation.clear();
        assert_eq!(conversation.state(), ConversationState::Idle);
    }

    #[test]
    fn recent_keeps_only_the_window() {
        let mut conversation = Conversation::new();
        for i in 0..5 {
            conversation.record(format!("q{i}"), format!("a{i}"));
        }
        let recent = conversation.recent(3);
        assert_eq!(recent.len(), 3);
        assert_eq!(recent[0].human, "q2");
        assert_eq!(conversation.len(), 5);
        assert_eq!(conversation.recent(10).len(), 5);
        assert!(conversation.recent(0).is_empty());
    }

    #[test]
    fn history_renders_human_and_ai_lines() {
        let history = [ConversationExchange::new("q1", "a1"), ConversationExchange::new("q2", "a2")];
        assert_eq!(render_history(&history), "Human: q1\nAI: a1\nHuman: q2\nAI: a2");
        assert_eq!(render_history(&[]), "");
    }
}
