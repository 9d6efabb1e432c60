//! docextract CLI - extract structured fields from scanned documents.
//!
//! Page images are OCR'd, rendered to text and sent to a hosted LLM together
//! with the list of keys to extract. Each document yields one JSON record.
//!
//! # Usage
//!
//! ```bash
//! # Extract two fields from each receipt
//! docextract extract --model gpt-4o --key total --key date receipts/*.png
//!
//! # Treat all images as pages of one document, layout-preserving text
//! docextract extract --model claude-3 --method latin --multipage -k total p1.png p2.png
//!
//! # Record an evaluation run
//! docextract log-result --dataset docvqa --model gpt-4o --method latin 0.8 1.0
//!
//! # View configuration
//! docextract config show
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cli;
mod logging;

/// docextract - document information extraction with OCR and LLMs.
#[derive(Parser, Debug)]
#[command(name = "docextract")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    /// Config file to use instead of the default location
    #[arg(long, global = true, env = "DOCEXTRACT_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Extract key/value fields from document images
    Extract(cli::extract::ExtractArgs),

    /// Append an evaluation score to the result log
    LogResult(cli::log_result::LogResultArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logging isn't initialized yet, so config warnings go through eprintln.
    let config = match &cli.config {
        Some(path) => docextract_core::Config::load_from(path)?,
        None => match docextract_core::Config::load() {
            Ok(config) => config,
            Err(e) => {
                eprintln!(
                    "Warning: Failed to load config: {e}\n  \
                     Using default configuration. Check your config file with `docextract config path`."
                );
                docextract_core::Config::default()
            }
        },
    };
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("docextract v{}", docextract_core::VERSION);

    match cli.command {
        Commands::Extract(args) => cli::extract::execute(args, config).await,
        Commands::LogResult(args) => cli::log_result::execute(args, &config),
        Commands::Config(args) => cli::config::execute(args, &config),
    }
}
