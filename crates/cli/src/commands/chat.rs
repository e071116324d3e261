//! `helpdesk chat` — Talk to the assistant from the terminal.

use std::io::{BufRead, Write};
use std::sync::Arc;

use helpdesk_chat::{ConversationService, StaticPrompts};
use helpdesk_config::AppConfig;
use helpdesk_core::SessionId;

pub async fn run(config: AppConfig, message: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    config.validate()?;

    if !config.has_api_key() {
        eprintln!();
        eprintln!("  ERROR: No API key configured!");
        eprintln!();
        eprintln!("  Set one of these environment variables:");
        eprintln!("    HELPDESK_API_KEY = 'sk-...'");
        eprintln!("    OPENAI_API_KEY   = 'sk-...'");
        eprintln!();
        eprintln!("  Or add `api_key` to helpdesk.toml");
        eprintln!();
        return Err("No API key found. See above for setup instructions.".into());
    }

    let prompts = StaticPrompts::load(&config.prompts)?;
    let provider = helpdesk_providers::build_from_config(&config)?;
    let knowledge = helpdesk_knowledge::build_from_config(
        &config.knowledge,
        provider.clone(),
        &config.embedding_model,
    );
    helpdesk_knowledge::ingest_document(
        knowledge.as_ref(),
        &provider,
        &config.embedding_model,
        &config.knowledge,
    )
    .await?;

    let sessions = helpdesk_sessions::build_from_config(&config.sessions);
    let metrics = Arc::new(helpdesk_metrics::build_from_config(&config.metrics));
    let service =
        ConversationService::new(&config, provider, knowledge, sessions, metrics, prompts);

    let session_id = SessionId::new();

    if let Some(msg) = message {
        // Single message mode
        let response = service.handle_message(&session_id, &msg).await?;
        println!("{response}");
        return Ok(());
    }

    // Interactive mode
    println!();
    println!("  Helpdesk — terminal chat");
    println!("  Model: {}", config.model);
    println!();
    println!("  Type your message and press Enter.");
    println!("  Type 'close' or Ctrl+C to quit.");
    println!();

    let stdin = std::io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("  You > ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next() else {
            break;
        };
        let line = line?;
        let trimmed = line.trim();

        if trimmed.is_empty() {
            continue;
        }
        if trimmed.eq_ignore_ascii_case("close") {
            break;
        }

        match service.handle_message(&session_id, trimmed).await {
            Ok(response) => {
                println!();
                for line in response.lines() {
                    println!("  Assistant > {line}");
                }
                println!();
            }
            Err(e) => {
                eprintln!("  [Error] {e}");
                println!();
            }
        }
    }

    println!();
    println!("  Goodbye!");
    println!();

    Ok(())
}
