//! # Knowledge Base Demo
//!
//! Ingests a few documents, then searches, answers, converses and summarizes.
//!
//! With `OPENAI_API_KEY` set (and the `openai` feature enabled) the live
//! OpenAI pipeline is used. Without it the service starts in fixture mode and
//! answers from its seed knowledge base, so it runs with **zero API keys**.
//!
//! Run: `cargo run --example knowledge_base --features openai`

use flowdesk_rag::{Conversation, DocumentInput, Metadata, RagConfig, RagService};
use serde_json::json;
use tracing_subscriber::EnvFilter;

fn sample_documents() -> Vec<DocumentInput> {
    let topic = |t: &str| Metadata::from([("topic".to_string(), json!(t))]);
    vec![
        DocumentInput::new(
            "Rust is a systems programming language focused on safety, speed, and \
             concurrency. It achieves memory safety without a garbage collector through its \
             ownership system.",
            topic("rust"),
        ),
        DocumentInput::new(
            "Retrieval-Augmented Generation (RAG) combines a retrieval system with a language \
             model. Documents are chunked, embedded, and stored in a vector index. At query \
             time the most relevant chunks are retrieved and handed to the model as context.",
            topic("rag"),
        ),
    ]
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    // -- 1. Build the service ---------------------------------------------
    let config = RagConfig::builder().chunk_size(400).chunk_overlap(80).top_k(3).build()?;
    let service = RagService::from_env(config)?;
    println!("Fixture mode: {}", service.is_fixture());

    // -- 2. Ingest --------------------------------------------------------
    let documents = service.add_documents(sample_documents()).await?;
    for doc in &documents {
        println!("  added {}", doc.id);
    }
    service.add_text_file("Ownership rules: each value has one owner.", "ownership.txt").await?;

    // -- 3. Search --------------------------------------------------------
    for query in ["memory safety", "vector index"] {
        println!("\nSearch: \"{query}\"");
        for (i, result) in service.search(query, 2).await?.iter().enumerate() {
            let preview: String = result.chunk.text.chars().take(80).collect();
            println!("  {}. [score={:.4}] {preview}", i + 1, result.score);
        }
    }

    // -- 4. Answer and converse -------------------------------------------
    let answer = service.generate_answer("What is RAG?", None, true).await?;
    println!("\nAnswer: {answer}");

    let mut conversation = Conversation::new();
    for question in ["How does Rust manage memory?", "Does it need a garbage collector?"] {
        let turn = service.converse(&mut conversation, question).await?;
        println!("\nQ: {question}\nA: {}\n  ({} sources)", turn.answer, turn.sources.len());
    }

    // -- 5. Summarize, inspect, reset -------------------------------------
    println!("\n{}", service.summarize(None).await?);

    let stats = service.stats().await;
    println!("\nStats: {}", serde_json::to_string(&stats)?);

    service.reset().await;
    println!("After reset: {}", serde_json::to_string(&service.stats().await)?);
    Ok(())
}
