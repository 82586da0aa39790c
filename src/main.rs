mod cli;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use mnemo::config::MnemoConfig;

#[derive(Parser)]
#[command(name = "mnemo", version, about = "Searchable archive of captured screen text and audio transcriptions")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Store one captured event
    Ingest {
        /// Source kind: ocr, transcription, summary, or a custom tag
        #[arg(long)]
        source: String,
        /// Extracted text; omit for non-text media
        #[arg(long)]
        content: Option<String>,
        /// Path to the screenshot or audio file
        #[arg(long)]
        media: Option<String>,
        /// Capture time as a Unix timestamp; defaults to now
        #[arg(long)]
        timestamp: Option<i64>,
        /// Store only; leave vectorization to a later sweep
        #[arg(long)]
        no_vectorize: bool,
    },
    /// Search captured content by meaning
    Search {
        query: String,
        /// Number of results to return
        #[arg(long)]
        top_k: Option<usize>,
    },
    /// Show archive statistics
    Stats,
    /// Vectorize the backlog; --force re-embeds everything
    Sweep {
        #[arg(long)]
        force: bool,
    },
    /// Show one event as JSON
    Inspect { id: i64 },
    /// Run database and index diagnostics
    Doctor,
    /// Manage the embedding model
    Model {
        #[command(subcommand)]
        action: ModelAction,
    },
}

#[derive(Subcommand)]
enum ModelAction {
    /// Download the embedding model to ~/.mnemo/models/
    Download,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();

    let config = MnemoConfig::load()?;

    // Log to stderr so stdout stays clean for piped output.
    let filter = EnvFilter::try_new(&config.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match args.command {
        Command::Ingest {
            source,
            content,
            media,
            timestamp,
            no_vectorize,
        } => cli::ingest::ingest(
            &config,
            &source,
            content.as_deref(),
            media.as_deref(),
            timestamp,
            no_vectorize,
        )?,
        Command::Search { query, top_k } => cli::search::search(&config, &query, top_k)?,
        Command::Stats => cli::stats::stats(&config)?,
        Command::Sweep { force } => cli::sweep::sweep(&config, force)?,
        Command::Inspect { id } => cli::inspect::inspect(&config, id)?,
        Command::Doctor => cli::doctor::doctor(&config)?,
        Command::Model { action } => match action {
            ModelAction::Download => cli::model_download(&config.embedding).await?,
        },
    }

    Ok(())
}
