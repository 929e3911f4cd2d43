//! Prompt templates.
//!
//! Templates are a closed set of named presets with `{name}` placeholders.
//! Rendering is a single left-to-right pass: substituted values are never
//! scanned again, so a retrieved chunk that happens to contain `{question}`
//! is inserted verbatim.

/// A prompt template with `{name}` placeholders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptTemplate {
    name: &'static str,
    template: &'static str,
}

impl PromptTemplate {
    /// Grounded question answering over retrieved or supplied context.
    pub const QUESTION_ANSWER: PromptTemplate = PromptTemplate {
        name: "question_answer",
        template: "\
You are an AI assistant with access to a knowledge base. Answer the question accurately \
and completely using the context below.

Context:
{context}

Question: {question}

Instructions:
- Base the answer on the context first
- Say clearly when the context does not contain enough information
- Include specific details and cite the relevant parts of the context
- Keep the answer concise but thorough

Answer:",
    };

    /// Question answering with no retrieved context.
    pub const GENERAL_KNOWLEDGE: PromptTemplate = PromptTemplate {
        name: "general_knowledge",
        template: "\
You are an AI assistant. No knowledge base context is available for this question, so \
answer from your general knowledge and say that you are doing so.

Question: {question}

Answer:",
    };

    /// A conversational turn grounded in retrieved context and prior exchanges.
    pub const CONVERSATIONAL: PromptTemplate = PromptTemplate {
        name: "conversational",
        template: "\
You are in a conversation with a user. Give a helpful, accurate reply using the knowledge \
base context and the conversation so far.

Context from knowledge base:
{context}

Conversation history:
{history}

Current question: {question}

Instructions:
- Follow the flow of the conversation
- Use the knowledge base where it is relevant
- Keep a conversational tone and refer back to earlier exchanges when useful
- Say so if the available context does not answer the question

Response:",
    };

    /// Structured summary of a set of retrieved chunks.
    pub const SUMMARY: PromptTemplate = PromptTemplate {
        name: "summary",
        template: "\
Write a comprehensive summary of the following documents:

{content}

Structure the summary with:
- Main topics and themes
- Key insights and findings
- Important details and figures
- Overall conclusions

Summary:",
    };

    /// Create a custom template.
    pub const fn new(name: &'static str, template: &'static str) -> Self {
        Self { name, template }
    }

    /// The preset name, used in logs.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The raw template text.
    pub fn template(&self) -> &'static str {
        self.template
    }

    /// Substitute `{key}` placeholders with the matching values.
    ///
    /// Placeholders without a value are left as they are.
    pub fn render(&self, values: &[(&str, &str)]) -> String {
        let mut out = String::with_capacity(self.template.len());
        let mut rest = self.template;

        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            let replacement = after.find('}').and_then(|close| {
                let key = &after[..close];
                values.iter().find(|(k, _)| *k == key).map(|(_, v)| (*v, close))
            });
            match replacement {
                Some((value, close)) => {
                    out.push_str(value);
                    rest = &after[close + 1..];
                }
                None => {
                    out.push('{');
                    rest = after;
                }
            }
        }
        out.push_str(rest);
        out
    }
}
