//! # Assistant Chat Demo
//!
//! Runs a short scripted conversation with every agent preset, or with the
//! one named on the command line (`data-analyst`, `code-assistant`,
//! `document-processor`, `ml-engineer`, `general`).
//!
//! Without `OPENAI_API_KEY` the agents answer from canned replies.
//!
//! Run: `cargo run --example assistant_chat --features openai -- code-assistant`

use flowdesk_rag::{AgentPreset, ChatAgent};
use tracing_subscriber::EnvFilter;

const SCRIPT: [&str; 3] = [
    "Hello!",
    "I get an error when loading my data, can you help?",
    "What would you recommend to optimize it?",
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .init();

    let presets = match std::env::args().nth(1) {
        Some(name) => vec![name.parse::<AgentPreset>()?],
        None => AgentPreset::ALL.to_vec(),
    };

    for preset in presets {
        println!("=== {preset} ===");
        let mut agent = ChatAgent::from_env(preset);
        for message in SCRIPT {
            let reply = agent.chat(message).await?;
            println!("Human: {message}\n{}: {reply}\n", preset.ai_label());
        }
        println!("Memory holds {} exchanges.\n", agent.memory().len());
        agent.clear_memory();
    }
    Ok(())
}
