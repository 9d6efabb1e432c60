//! The `docextract log-result` command.

use clap::Args;
use docextract_core::{Config, ResultLog};
use std::path::PathBuf;

/// Arguments for the `log-result` command.
#[derive(Args, Debug)]
pub struct LogResultArgs {
    /// Dataset the scores were measured on
    #[arg(long)]
    pub dataset: String,

    /// Model identifier used for the run
    #[arg(long)]
    pub model: String,

    /// Prompting method used for the run
    #[arg(long)]
    pub method: String,

    /// Result log file (defaults to `general.results_log`)
    #[arg(long)]
    pub log: Option<PathBuf>,

    /// Per-document ANLS* scores; none logs a mean of 0.0
    #[arg(allow_negative_numbers = true)]
    pub scores: Vec<f64>,
}

/// Execute the log-result command.
pub fn execute(args: LogResultArgs, config: &Config) -> anyhow::Result<()> {
    let path = args.log.unwrap_or_else(|| config.results_log_path());
    let log = ResultLog::new(path);
    let line = log.append(&args.dataset, &args.model, &args.method, &args.scores)?;
    print!("{line}");
    Ok(())
}
