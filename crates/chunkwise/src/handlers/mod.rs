//! Subcommand handlers

pub mod models;
pub mod summarize;

pub use models::models_handler;
pub use summarize::{SummarizeArgs, summarize_handler, summarize_text, write_result};
