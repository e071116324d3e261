//! Helpdesk CLI — the main entry point.
//!
//! Commands:
//! - `serve`   — Start the HTTP gateway
//! - `chat`    — Talk to the assistant from the terminal
//! - `ingest`  — Chunk and embed the knowledge base document
//! - `metrics` — Show the current usage metrics

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "helpdesk",
    about = "Helpdesk — retrieval-augmented customer support chatbot",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the configuration file
    #[arg(short, long, global = true)]
    config: Option<std::path::PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP gateway server
    Serve {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Chat with the assistant in the terminal
    Chat {
        /// Send a single message instead of entering interactive mode
        #[arg(short, long)]
        message: Option<String>,
    },

    /// Ingest the knowledge base document into the index
    Ingest {
        /// Clear the existing index before ingesting
        #[arg(long)]
        force: bool,
    },

    /// Show current usage metrics
    Metrics,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    let config = match &cli.config {
        Some(path) => helpdesk_config::AppConfig::load_from(path),
        None => helpdesk_config::AppConfig::load(),
    }
    .map_err(|e| format!("Failed to load config: {e}"))?;

    match cli.command {
        Commands::Serve { port } => commands::serve::run(config, port).await?,
        Commands::Chat { message } => commands::chat::run(config, message).await?,
        Commands::Ingest { force } => commands::ingest::run(config, force).await?,
        Commands::Metrics => commands::metrics::run(config).await?,
    }

    Ok(())
}
