mod cli;
mod config;
mod db;
mod embedding;
mod engine;
mod error;
mod server;
mod wardrobe;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "garb", version, about = "Occasion-aware outfit recommendations from your wardrobe")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the HTTP recommendation service
    Serve,
    /// Recommend outfits for an occasion, once, in the terminal
    Suggest {
        /// Free-text occasion, e.g. "business meeting" or "going to swim"
        query: String,
        /// Number of outfits to return
        #[arg(short, long)]
        k: Option<usize>,
    },
    /// Manage the embedding model
    Model {
        #[command(subcommand)]
        action: ModelAction,
    },
    /// Regenerate all cached embeddings with the configured model
    ReEmbed,
    /// Show wardrobe and embedding cache statistics
    Stats,
}

#[derive(Subcommand)]
enum ModelAction {
    /// Download the embedding model to ~/.garb/models/
    Download,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load config (for log level)
    let config = config::GarbConfig::load()?;

    // Initialize tracing with the configured log level. Log to stderr so
    // stdout stays clean for command output.
    let filter = EnvFilter::try_new(&config.server.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Serve => {
            server::serve(config).await?;
        }
        Command::Suggest { query, k } => {
            cli::suggest::suggest(&config, &query, k).await?;
        }
        Command::Model { action } => match action {
            ModelAction::Download => {
                cli::model_download(&config.embedding).await?;
            }
        },
        Command::ReEmbed => {
            cli::re_embed::re_embed(&config).await?;
        }
        Command::Stats => {
            cli::stats::stats(&config)?;
        }
    }

    Ok(())
}
