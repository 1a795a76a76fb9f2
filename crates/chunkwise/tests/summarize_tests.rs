//! `summarize` subcommand against a scripted provider

use chunkwise::handlers::{SummarizeArgs, summarize_text, write_result};
use chunkwise_config::DEFAULT_MODEL;
use chunkwise_llm::test_utils::ScriptedCompletionClient;
use chunkwise_llm::{ApiError, CompletionClient};
use chunkwise_summarization::{JobStatus, TokenCounterRegistry};
use chunkwise_test_utils::{WordCounter, fast_config, sample_document};
use std::path::PathBuf;
use std::sync::Arc;

fn counters() -> Arc<TokenCounterRegistry> {
    let counters = Arc::new(TokenCounterRegistry::new());
    for model in [DEFAULT_MODEL, "gpt-4"] {
        counters.register(model, Arc::new(WordCounter::new()));
    }
    counters
}

fn args(output: Option<PathBuf>) -> SummarizeArgs {
    SummarizeArgs {
        input: PathBuf::from("-"),
        model: None,
        output,
        json: false,
    }
}

#[tokio::test]
async fn test_summary_is_written_to_output_file() {
    let client = Arc::new(ScriptedCompletionClient::always("  the gist  "));
    let shared: Arc<dyn CompletionClient> = Arc::<ScriptedCompletionClient>::clone(&client);

    let result = summarize_text(&sample_document(3, 12), None, &fast_config(), shared, counters()).await;
    assert_eq!(result.status, JobStatus::Completed, "{result:?}");
    assert_eq!(result.model, DEFAULT_MODEL);
    assert_eq!(client.call_count(), 1);

    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("summary.txt");
    let mut stdout = Vec::new();
    write_result(&result, &args(Some(path.clone())), &mut stdout).expect("write");

    assert!(stdout.is_empty());
    assert_eq!(std::fs::read_to_string(path).expect("read"), "the gist");
}

#[tokio::test]
async fn test_requested_model_reaches_the_provider() {
    let client = Arc::new(ScriptedCompletionClient::always("summary"));
    let shared: Arc<dyn CompletionClient> = Arc::<ScriptedCompletionClient>::clone(&client);

    let result = summarize_text("One short paragraph.", Some("gpt-4"), &fast_config(), shared, counters()).await;

    assert_eq!(result.status, JobStatus::Completed);
    assert_eq!(result.model, "gpt-4");
    let requests = client.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].model, "gpt-4");
}

#[tokio::test]
async fn test_failed_job_is_an_error() {
    let client = Arc::new(ScriptedCompletionClient::failing(ApiError::http(401, "invalid api key")));
    let shared: Arc<dyn CompletionClient> = Arc::<ScriptedCompletionClient>::clone(&client);

    let result = summarize_text(&sample_document(2, 5), None, &fast_config(), shared, counters()).await;
    assert_eq!(result.status, JobStatus::Error);

    let mut stdout = Vec::new();
    let err = write_result(&result, &args(None), &mut stdout).expect_err("error status");
    assert!(err.to_string().contains("no valid summaries generated"), "{err}");
    assert!(stdout.is_empty());
}
