//! Application bootstrap and service initialization
//!
//! Keeps configuration loading and dependency wiring out of `main`.

use crate::AppState;
use chunkwise_config::source::{ConfigurationLoader, EnvironmentSource, file_source};
use chunkwise_config::ApplicationConfig;
use chunkwise_llm::{CompletionClient, OpenAiCompatibleClient};
use chunkwise_parsing::TokenCounterRegistry;
use chunkwise_summarization::{JobRegistry, SummarizationPipeline};
use std::sync::Arc;
use tracing::{info, warn};

/// Bootstrap result type
pub type BootstrapResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Environment variable naming an optional TOML or YAML config file
pub const CONFIG_FILE_ENV: &str = "CHUNKWISE_CONFIG_FILE";

/// Defaults, then the optional config file, then `CHUNKWISE_*` variables
///
/// # Errors
///
/// Returns error if the merged configuration fails validation
pub fn load_config() -> BootstrapResult<ApplicationConfig> {
    let mut loader = ConfigurationLoader::new().add_source(Box::new(EnvironmentSource));
    if let Ok(path) = std::env::var(CONFIG_FILE_ENV) {
        info!("Loading configuration file {path}");
        loader = loader.add_source(file_source(path));
    }
    Ok(loader.load()?)
}

/// Build the completion client for the configured provider
pub fn setup_completion_client(config: &ApplicationConfig) -> Arc<dyn CompletionClient> {
    if config.llm.api_key.is_none() {
        warn!("No API key configured; requests to {} are unauthenticated", config.llm.base_url);
    }
    Arc::new(OpenAiCompatibleClient::from_config(&config.llm))
}

/// Wire the pipeline and job registry around a completion client
pub fn build_app_state(
    config: &ApplicationConfig,
    client: Arc<dyn CompletionClient>,
    counters: Arc<TokenCounterRegistry>,
) -> AppState {
    let pipeline = Arc::new(SummarizationPipeline::new(client, counters, config));
    let jobs = Arc::new(JobRegistry::with_retention(config.api.max_retained_jobs));
    AppState::new(pipeline, jobs, config.api.max_document_bytes)
}

/// Initialize all services and create application state
///
/// # Errors
///
/// Returns error if the default model's tokenizer cannot be loaded
pub fn initialize_app_state(config: &ApplicationConfig) -> BootstrapResult<AppState> {
    let counters = Arc::new(TokenCounterRegistry::new());

    // Load the default encoder up front so a broken tokenizer fails startup
    let (_, profile) = chunkwise_config::ModelProfile::for_model(&config.llm.default_model);
    counters.for_model(&config.llm.default_model, profile.context_window())?;

    let client = setup_completion_client(config);
    let state = build_app_state(config, client, counters);

    info!(
        default_model = %config.llm.default_model,
        concurrency = config.summarization.chunk_concurrency,
        "Application state initialized"
    );
    Ok(state)
}
