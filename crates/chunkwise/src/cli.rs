//! Command-line arguments

use crate::handlers::SummarizeArgs;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Token-budget-aware document summarizer
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Configuration file (TOML, or YAML by extension)
    #[arg(long, short = 'c', global = true)]
    pub config: Option<PathBuf>,

    /// Log directory path (defaults to OS-specific location)
    #[arg(long, global = true)]
    pub log_dir: Option<PathBuf>,

    /// Emit log lines as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Summarize a document
    Summarize(SummarizeArgs),

    /// List the built-in model profiles
    Models {
        /// Print the profiles as JSON
        #[arg(long)]
        json: bool,
    },
}
