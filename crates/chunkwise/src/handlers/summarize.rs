//! `chunkwise summarize`

use anyhow::Context;
use chunkwise_config::ApplicationConfig;
use chunkwise_llm::{CompletionClient, OpenAiCompatibleClient};
use chunkwise_summarization::{
    JobStatus, ProgressTracker, SummarizationPipeline, SummaryResult, TokenCounterRegistry,
};
use clap::Args;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

const PROGRESS_INTERVAL: Duration = Duration::from_secs(2);

#[derive(Args, Debug, Clone)]
pub struct SummarizeArgs {
    /// Document to summarize, `-` for stdin
    #[arg(short, long, default_value = "-")]
    pub input: PathBuf,

    /// Model to use (defaults to the configured model)
    #[arg(short, long)]
    pub model: Option<String>,

    /// Write the summary to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Print the full result, counts included, as JSON on stdout
    #[arg(long)]
    pub json: bool,
}

/// Summarize one document against the configured provider
///
/// # Errors
/// Fails when the input cannot be read, the output cannot be written, or
/// the job ends in an error status
pub async fn summarize_handler(args: &SummarizeArgs, config: &ApplicationConfig) -> anyhow::Result<()> {
    let text = read_input(&args.input)?;

    if config.llm.api_key.is_none() {
        warn!("No API key configured; requests to {} are unauthenticated", config.llm.base_url);
    }
    let client: Arc<dyn CompletionClient> = Arc::new(OpenAiCompatibleClient::from_config(&config.llm));
    let counters = Arc::new(TokenCounterRegistry::new());

    let result = summarize_text(&text, args.model.as_deref(), config, client, counters).await;
    write_result(&result, args, &mut std::io::stdout().lock())
}

/// Run one job to completion, cancelling it on Ctrl-C
pub async fn summarize_text(
    text: &str,
    model: Option<&str>,
    config: &ApplicationConfig,
    client: Arc<dyn CompletionClient>,
    counters: Arc<TokenCounterRegistry>,
) -> SummaryResult {
    let pipeline = SummarizationPipeline::new(client, counters, config);
    let tracker = Arc::new(ProgressTracker::new(Uuid::new_v4()));
    let cancel = CancellationToken::new();

    let interrupt = tokio::spawn(cancel_on_interrupt(cancel.clone()));
    let reporter = tokio::spawn(report_progress(Arc::clone(&tracker)));

    let result = pipeline
        .process_text_document(text, model.unwrap_or_default(), &tracker, &cancel)
        .await;

    interrupt.abort();
    reporter.abort();
    result
}

/// Print or save the outcome of a job
///
/// # Errors
/// Returns the job's error for an error status, or an I/O failure
pub fn write_result(
    result: &SummaryResult,
    args: &SummarizeArgs,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    if args.json {
        serde_json::to_writer_pretty(&mut *out, result)?;
        writeln!(out)?;
    }

    let summary = match (result.status, result.summary.as_deref()) {
        (JobStatus::Completed, Some(summary)) => summary,
        _ => anyhow::bail!(
            "summarization failed: {}",
            result.error.as_deref().unwrap_or("no summary produced")
        ),
    };

    match &args.output {
        Some(path) => {
            write_summary_file(path, summary)?;
            info!(path = %path.display(), "Summary written");
        }
        None if !args.json => writeln!(out, "{summary}")?,
        None => {}
    }

    info!(
        model = %result.model,
        total_chunks = result.total_chunks,
        failed_chunks = result.failed_chunks,
        "Summarization complete"
    );
    Ok(())
}

fn read_input(path: &Path) -> anyhow::Result<String> {
    if path == Path::new("-") {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("failed to read document from stdin")?;
        return Ok(text);
    }
    std::fs::read_to_string(path)
        .with_context(|| format!("failed to read document '{}'", path.display()))
}

fn write_summary_file(path: &Path, summary: &str) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create '{}'", parent.display()))?;
    }
    std::fs::write(path, summary)
        .with_context(|| format!("failed to write summary to '{}'", path.display()))
}

async fn cancel_on_interrupt(cancel: CancellationToken) {
    if tokio::signal::ctrl_c().await.is_ok() {
        warn!("Interrupted, cancelling job");
        cancel.cancel();
    }
}

async fn report_progress(tracker: Arc<ProgressTracker>) {
    let mut ticker = tokio::time::interval(PROGRESS_INTERVAL);
    let mut reported = None;
    loop {
        ticker.tick().await;
        let state = tracker.get_status();
        if state.total_chunks > 0 && reported != Some(state.progress) {
            info!(
                progress = state.progress,
                processed = state.processed_chunks,
                total = state.total_chunks,
                "Summarizing"
            );
            reported = Some(state.progress);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> SummarizeArgs {
        SummarizeArgs {
            input: PathBuf::from("-"),
            model: None,
            output: None,
            json: false,
        }
    }

    fn completed(summary: &str) -> SummaryResult {
        SummaryResult {
            status: JobStatus::Completed,
            summary: Some(summary.to_string()),
            error: None,
            progress: 100,
            total_chunks: 2,
            successful_chunks: 2,
            failed_chunks: 0,
            model: "gpt-3.5-turbo".to_string(),
        }
    }

    #[test]
    fn test_summary_goes_to_stdout() {
        let mut out = Vec::new();
        write_result(&completed("short version"), &args(), &mut out).expect("write");
        assert_eq!(String::from_utf8(out).expect("utf8"), "short version\n");
    }

    #[test]
    fn test_output_file_is_created_with_parents() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("nested").join("summary.txt");
        let args = SummarizeArgs {
            output: Some(path.clone()),
            ..args()
        };

        let mut out = Vec::new();
        write_result(&completed("saved"), &args, &mut out).expect("write");
        assert!(out.is_empty());
        assert_eq!(std::fs::read_to_string(path).expect("read"), "saved");
    }

    #[test]
    fn test_json_result_is_printed_even_on_failure() {
        let failed = SummaryResult {
            status: JobStatus::Error,
            summary: None,
            error: Some("no valid summaries generated".to_string()),
            progress: 100,
            failed_chunks: 2,
            successful_chunks: 0,
            ..completed("")
        };
        let args = SummarizeArgs { json: true, ..args() };

        let mut out = Vec::new();
        let err = write_result(&failed, &args, &mut out).expect_err("error status");
        assert!(err.to_string().contains("no valid summaries generated"));

        let printed: SummaryResult = serde_json::from_slice(&out).expect("json");
        assert_eq!(printed, failed);
    }

    #[test]
    fn test_missing_input_file() {
        let err = read_input(Path::new("/nonexistent/document.txt")).expect_err("missing");
        assert!(err.to_string().contains("/nonexistent/document.txt"));
    }
}
