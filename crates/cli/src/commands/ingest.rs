//! `helpdesk ingest` — Chunk and embed the knowledge base document.

use helpdesk_config::AppConfig;

pub async fn run(config: AppConfig, force: bool) -> Result<(), Box<dyn std::error::Error>> {
    config.validate()?;

    let provider = helpdesk_providers::build_from_config(&config)?;
    let knowledge = helpdesk_knowledge::build_from_config(
        &config.knowledge,
        provider.clone(),
        &config.embedding_model,
    );

    if force {
        println!("Clearing existing index ({} backend)", knowledge.name());
        knowledge.clear().await?;
    }

    let count = helpdesk_knowledge::ingest_document(
        knowledge.as_ref(),
        &provider,
        &config.embedding_model,
        &config.knowledge,
    )
    .await?;

    println!("Knowledge index ready: {count} chunks ({} backend)", knowledge.name());
    if knowledge.name() == "memory" {
        println!("Note: the in-memory backend does not persist; `serve` re-ingests at startup.");
    }

    Ok(())
}
