//! Centralized configuration management for chunkwise
//!
//! Configuration follows a simple hierarchy:
//! 1. Safe defaults (defined as constants)
//! 2. Optional TOML or YAML file
//! 3. `CHUNKWISE_*` environment variable overrides
//! 4. Runtime validation
//!
//! Per-model token limits are not configured here at runtime; they come from
//! the [`ModelProfile`] registry.

pub mod error;
pub mod profile;
pub mod source;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use profile::{DEFAULT_MODEL, ModelProfile};

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

// =============================================================================
// SAFE DEFAULTS
// =============================================================================

// Completion provider
const DEFAULT_LLM_BASE_URL: &str = "https://api.openai.com";
const DEFAULT_LLM_TEMPERATURE: f64 = 0.7;
const DEFAULT_LLM_MAX_OUTPUT_TOKENS: u32 = 1000;

// Retry policy
const DEFAULT_RETRY_MAX_RETRIES: u32 = 3; // Total attempts, first one included
const DEFAULT_RETRY_BASE_DELAY_MS: u64 = 1000;
const DEFAULT_RETRY_RATE_LIMIT_BASE_DELAY_MS: u64 = 2000;
const DEFAULT_RETRY_MAX_DELAY_MS: u64 = 60_000;
const DEFAULT_RETRY_JITTER_RATIO: f64 = 0.1;
const DEFAULT_RETRY_CLIENT_ERRORS: bool = false;

// Request timeouts
const DEFAULT_TIMEOUT_BASE_SECONDS: u64 = 30;
const DEFAULT_TIMEOUT_PER_1K_TOKENS_SECONDS: u64 = 3;

// Summarization
const DEFAULT_CHUNK_CONCURRENCY: usize = 1; // Sequential, like a single worker

// API server
const DEFAULT_API_HOST: &str = "127.0.0.1"; // Localhost only for security
const DEFAULT_API_PORT: u16 = 3000;
const DEFAULT_API_MAX_DOCUMENT_BYTES: usize = 10 * 1024 * 1024;
const DEFAULT_API_MAX_RETAINED_JOBS: usize = 1000;

// Telemetry
const DEFAULT_TRACING_LEVEL: &str = "info";
const DEFAULT_JSON_LOGS: bool = false;

/// Overwrite `target` with the parsed value of `key` when it is set and valid
fn override_from_env<T: FromStr>(target: &mut T, key: &str) {
    if let Ok(raw) = std::env::var(key) {
        match raw.trim().parse() {
            Ok(value) => *target = value,
            Err(_) => tracing::warn!("Ignoring unparseable value for {key}: '{raw}'"),
        }
    }
}

/// Core configuration for the chunkwise services
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationConfig {
    /// Completion provider settings
    pub llm: LlmConfig,

    /// Backoff policy for failed completion calls
    pub retry: RetryConfig,

    /// Per-request timeout scaling
    pub timeout: TimeoutConfig,

    /// Pipeline settings
    pub summarization: SummarizationConfig,

    /// API server configuration
    pub api: ApiConfig,

    /// Logging configuration
    pub telemetry: TelemetryConfig,
}

/// Completion provider configuration
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Base URL of an OpenAI-compatible endpoint (without `/v1/...`)
    pub base_url: String,

    /// Bearer token; never serialized back out
    #[serde(skip_serializing)]
    pub api_key: Option<String>,

    /// Model used when a request does not name one
    pub default_model: String,

    /// Sampling temperature sent with every request
    pub temperature: f64,

    /// Cap on generated tokens per request
    pub max_output_tokens: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_LLM_BASE_URL.to_string(),
            api_key: None,
            default_model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_LLM_TEMPERATURE,
            max_output_tokens: DEFAULT_LLM_MAX_OUTPUT_TOKENS,
        }
    }
}

impl std::fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("default_model", &self.default_model)
            .field("temperature", &self.temperature)
            .field("max_output_tokens", &self.max_output_tokens)
            .finish()
    }
}

impl LlmConfig {
    /// Load configuration from environment variables with safe defaults
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    fn apply_env(&mut self) {
        override_from_env(&mut self.base_url, "CHUNKWISE_LLM_BASE_URL");
        override_from_env(&mut self.default_model, "CHUNKWISE_LLM_MODEL");
        override_from_env(&mut self.temperature, "CHUNKWISE_LLM_TEMPERATURE");
        override_from_env(&mut self.max_output_tokens, "CHUNKWISE_LLM_MAX_OUTPUT_TOKENS");

        // Provider-native variable accepted as a fallback
        if let Some(key) = std::env::var("CHUNKWISE_LLM_API_KEY")
            .or_else(|_| std::env::var("OPENAI_API_KEY"))
            .ok()
            .filter(|k| !k.trim().is_empty())
        {
            self.api_key = Some(key);
        }
    }
}

impl validation::Validate for LlmConfig {
    fn validate(&self) -> ConfigResult<()> {
        validation::validate_url(&self.base_url, "base_url")?;
        validation::validate_non_empty(&self.default_model, "default_model")?;
        validation::validate_float_range(self.temperature, 0.0, 2.0, "temperature")?;
        validation::validate_range(
            u64::from(self.max_output_tokens),
            1,
            128_000,
            "max_output_tokens",
        )?;
        Ok(())
    }
}

/// Backoff policy configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts per completion call, the first one included
    pub max_retries: u32,

    /// Base wait for server faults, client faults and unclassified failures
    pub base_delay_ms: u64,

    /// Base wait after a rate-limit response
    pub rate_limit_base_delay_ms: u64,

    /// Upper bound on any single wait, before jitter
    pub max_delay_ms: u64,

    /// Random extra wait as a fraction of the computed wait (0.1 = up to 10%)
    pub jitter_ratio: f64,

    /// Keep retrying 4xx responses instead of failing on the first one
    pub retry_client_errors: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_RETRY_MAX_RETRIES,
            base_delay_ms: DEFAULT_RETRY_BASE_DELAY_MS,
            rate_limit_base_delay_ms: DEFAULT_RETRY_RATE_LIMIT_BASE_DELAY_MS,
            max_delay_ms: DEFAULT_RETRY_MAX_DELAY_MS,
            jitter_ratio: DEFAULT_RETRY_JITTER_RATIO,
            retry_client_errors: DEFAULT_RETRY_CLIENT_ERRORS,
        }
    }
}

impl RetryConfig {
    /// Load configuration from environment variables with safe defaults
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    fn apply_env(&mut self) {
        override_from_env(&mut self.max_retries, "CHUNKWISE_RETRY_MAX_RETRIES");
        override_from_env(&mut self.base_delay_ms, "CHUNKWISE_RETRY_BASE_DELAY_MS");
        override_from_env(
            &mut self.rate_limit_base_delay_ms,
            "CHUNKWISE_RETRY_RATE_LIMIT_BASE_DELAY_MS",
        );
        override_from_env(&mut self.max_delay_ms, "CHUNKWISE_RETRY_MAX_DELAY_MS");
        override_from_env(&mut self.jitter_ratio, "CHUNKWISE_RETRY_JITTER_RATIO");
        override_from_env(
            &mut self.retry_client_errors,
            "CHUNKWISE_RETRY_CLIENT_ERRORS",
        );
    }

    pub const fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }

    pub const fn rate_limit_base_delay(&self) -> Duration {
        Duration::from_millis(self.rate_limit_base_delay_ms)
    }

    pub const fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }
}

impl validation::Validate for RetryConfig {
    fn validate(&self) -> ConfigResult<()> {
        validation::validate_range(u64::from(self.max_retries), 1, 20, "max_retries")?;
        validation::validate_range(self.max_delay_ms, 1, 3_600_000, "max_delay_ms")?;
        validation::validate_float_range(self.jitter_ratio, 0.0, 1.0, "jitter_ratio")?;

        if self.rate_limit_base_delay_ms < self.base_delay_ms {
            return Err(ConfigError::invalid(
                "rate_limit_base_delay_ms",
                format!(
                    "{} is shorter than base_delay_ms ({})",
                    self.rate_limit_base_delay_ms, self.base_delay_ms
                ),
            ));
        }
        Ok(())
    }
}

/// Request timeout configuration
///
/// Larger prompts get proportionally more time:
/// `base + input_tokens / 1000 * per_1k_tokens`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    pub base_timeout_seconds: u64,
    pub per_1k_tokens_seconds: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            base_timeout_seconds: DEFAULT_TIMEOUT_BASE_SECONDS,
            per_1k_tokens_seconds: DEFAULT_TIMEOUT_PER_1K_TOKENS_SECONDS,
        }
    }
}

impl TimeoutConfig {
    /// Load configuration from environment variables with safe defaults
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    fn apply_env(&mut self) {
        override_from_env(
            &mut self.base_timeout_seconds,
            "CHUNKWISE_TIMEOUT_BASE_SECONDS",
        );
        override_from_env(
            &mut self.per_1k_tokens_seconds,
            "CHUNKWISE_TIMEOUT_PER_1K_TOKENS_SECONDS",
        );
    }

    /// Timeout for a request carrying `input_tokens` prompt tokens
    #[allow(clippy::cast_precision_loss)]
    pub fn timeout_for(&self, input_tokens: usize) -> Duration {
        let scaled = input_tokens as f64 / 1000.0 * self.per_1k_tokens_seconds as f64;
        Duration::from_secs(self.base_timeout_seconds) + Duration::from_secs_f64(scaled)
    }
}

impl validation::Validate for TimeoutConfig {
    fn validate(&self) -> ConfigResult<()> {
        validation::validate_range(self.base_timeout_seconds, 1, 3600, "base_timeout_seconds")?;
        validation::validate_range(self.per_1k_tokens_seconds, 0, 600, "per_1k_tokens_seconds")?;
        Ok(())
    }
}

/// Pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SummarizationConfig {
    /// Chunks summarized at the same time within one job
    pub chunk_concurrency: usize,
}

impl Default for SummarizationConfig {
    fn default() -> Self {
        Self {
            chunk_concurrency: DEFAULT_CHUNK_CONCURRENCY,
        }
    }
}

impl SummarizationConfig {
    /// Load configuration from environment variables with safe defaults
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    fn apply_env(&mut self) {
        override_from_env(
            &mut self.chunk_concurrency,
            "CHUNKWISE_SUMMARIZATION_CHUNK_CONCURRENCY",
        );
    }
}

impl validation::Validate for SummarizationConfig {
    fn validate(&self) -> ConfigResult<()> {
        validation::validate_range(self.chunk_concurrency as u64, 1, 64, "chunk_concurrency")
    }
}

/// API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Server host address
    pub host: String,

    /// Server port
    pub port: u16,

    /// Largest accepted request body
    pub max_document_bytes: usize,

    /// Finished background jobs kept for polling; older ones are evicted
    pub max_retained_jobs: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_API_HOST.to_string(),
            port: DEFAULT_API_PORT,
            max_document_bytes: DEFAULT_API_MAX_DOCUMENT_BYTES,
            max_retained_jobs: DEFAULT_API_MAX_RETAINED_JOBS,
        }
    }
}

impl ApiConfig {
    /// Load configuration from environment variables with safe defaults
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    fn apply_env(&mut self) {
        override_from_env(&mut self.host, "CHUNKWISE_API_HOST");
        override_from_env(&mut self.port, "CHUNKWISE_API_PORT");
        override_from_env(
            &mut self.max_document_bytes,
            "CHUNKWISE_API_MAX_DOCUMENT_BYTES",
        );
        override_from_env(
            &mut self.max_retained_jobs,
            "CHUNKWISE_API_MAX_RETAINED_JOBS",
        );
    }

    /// `host:port` for binding
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl validation::Validate for ApiConfig {
    fn validate(&self) -> ConfigResult<()> {
        validation::validate_non_empty(&self.host, "host")?;
        validation::validate_port(self.port, "port")?;
        validation::validate_range(
            self.max_document_bytes as u64,
            1,
            1024 * 1024 * 1024,
            "max_document_bytes",
        )?;
        validation::validate_range(
            self.max_retained_jobs as u64,
            1,
            1_000_000,
            "max_retained_jobs",
        )?;
        Ok(())
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Default filter when `RUST_LOG` is unset
    pub tracing_level: String,

    /// Emit JSON log lines instead of human-readable ones
    pub json_logs: bool,

    /// Directory for rolling log files; no file logging when unset
    pub log_dir: Option<String>,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            tracing_level: DEFAULT_TRACING_LEVEL.to_string(),
            json_logs: DEFAULT_JSON_LOGS,
            log_dir: None,
        }
    }
}

impl TelemetryConfig {
    /// Load configuration from environment variables with safe defaults
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    fn apply_env(&mut self) {
        override_from_env(&mut self.tracing_level, "CHUNKWISE_TELEMETRY_TRACING_LEVEL");
        override_from_env(&mut self.json_logs, "CHUNKWISE_TELEMETRY_JSON_LOGS");
        if let Ok(dir) = std::env::var("CHUNKWISE_TELEMETRY_LOG_DIR") {
            self.log_dir = Some(dir);
        }
    }
}

impl validation::Validate for TelemetryConfig {
    fn validate(&self) -> ConfigResult<()> {
        match self.tracing_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
            _ => Err(ConfigError::invalid(
                "tracing_level",
                format!("unknown level '{}'", self.tracing_level),
            )),
        }
    }
}

impl ApplicationConfig {
    /// Defaults with every `CHUNKWISE_*` override applied
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Apply environment overrides on top of an existing configuration
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        self.llm.apply_env();
        self.retry.apply_env();
        self.timeout.apply_env();
        self.summarization.apply_env();
        self.api.apply_env();
        self.telemetry.apply_env();
        self
    }
}

impl validation::Validate for ApplicationConfig {
    fn validate(&self) -> ConfigResult<()> {
        self.llm.validate()?;
        self.retry.validate()?;
        self.timeout.validate()?;
        self.summarization.validate()?;
        self.api.validate()?;
        self.telemetry.validate()?;

        // Backoff must have room to grow before hitting the cap
        if self.retry.max_delay_ms < self.retry.base_delay_ms {
            return Err(ConfigError::invalid(
                "max_delay_ms",
                format!(
                    "{} is below base_delay_ms ({})",
                    self.retry.max_delay_ms, self.retry.base_delay_ms
                ),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::Validate;

    #[test]
    fn test_defaults_match_reference_constants() {
        let config = ApplicationConfig::default();
        assert_eq!(config.retry.max_retries, 3);
        assert_eq!(config.retry.base_delay(), Duration::from_secs(1));
        assert_eq!(config.retry.rate_limit_base_delay(), Duration::from_secs(2));
        assert_eq!(config.retry.max_delay(), Duration::from_secs(60));
        assert_eq!(config.timeout.base_timeout_seconds, 30);
        assert_eq!(config.summarization.chunk_concurrency, 1);
        assert_eq!(config.llm.default_model, DEFAULT_MODEL);
    }

    #[test]
    fn test_from_env_creates_valid_config() {
        let config = ApplicationConfig::from_env();
        let validation_result = config.validate();
        assert!(
            validation_result.is_ok(),
            "from_env() should create valid config: {validation_result:?}"
        );
    }

    #[test]
    fn test_timeout_scales_with_input_size() {
        let timeouts = TimeoutConfig::default();
        assert_eq!(timeouts.timeout_for(0), Duration::from_secs(30));
        assert_eq!(timeouts.timeout_for(1000), Duration::from_secs(33));
        assert_eq!(timeouts.timeout_for(2500), Duration::from_millis(37_500));
        assert!(timeouts.timeout_for(3001) > timeouts.timeout_for(3000));
    }

    #[test]
    fn test_environment_variable_overrides() {
        unsafe {
            std::env::set_var("CHUNKWISE_SUMMARIZATION_CHUNK_CONCURRENCY", "4");
            std::env::set_var("CHUNKWISE_RETRY_CLIENT_ERRORS", "true");
        }

        let config = ApplicationConfig::from_env();

        assert_eq!(config.summarization.chunk_concurrency, 4);
        assert!(config.retry.retry_client_errors);

        unsafe {
            std::env::remove_var("CHUNKWISE_SUMMARIZATION_CHUNK_CONCURRENCY");
            std::env::remove_var("CHUNKWISE_RETRY_CLIENT_ERRORS");
        }
    }

    #[test]
    fn test_unparseable_override_keeps_default() {
        unsafe {
            std::env::set_var("CHUNKWISE_TIMEOUT_PER_1K_TOKENS_SECONDS", "three");
        }

        let config = TimeoutConfig::from_env();
        assert_eq!(
            config.per_1k_tokens_seconds,
            DEFAULT_TIMEOUT_PER_1K_TOKENS_SECONDS
        );

        unsafe {
            std::env::remove_var("CHUNKWISE_TIMEOUT_PER_1K_TOKENS_SECONDS");
        }
    }

    #[test]
    fn test_validation_rejects_invalid_base_url() {
        let mut config = ApplicationConfig::default();
        config.llm.base_url = "not-a-valid-url".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn test_rate_limit_base_must_not_be_shorter() {
        let mut config = ApplicationConfig::default();
        config.retry.rate_limit_base_delay_ms = 500;

        let validation_result = config.validate();
        assert!(validation_result.is_err());
        if let Err(error) = validation_result {
            assert!(error.to_string().contains("rate_limit_base_delay_ms"));
        }
    }

    #[test]
    fn test_job_retention_must_keep_at_least_one() {
        let mut config = ApplicationConfig::default();
        assert_eq!(config.api.max_retained_jobs, DEFAULT_API_MAX_RETAINED_JOBS);
        config.api.max_retained_jobs = 0;

        let validation_result = config.validate();
        assert!(validation_result.is_err());
        if let Err(error) = validation_result {
            assert!(error.to_string().contains("max_retained_jobs"));
        }
    }

    #[test]
    fn test_telemetry_config_validation() {
        let mut config = ApplicationConfig::default();
        config.telemetry.tracing_level = "invalid-level".to_string();

        let validation_result = config.validate();
        assert!(validation_result.is_err());
        if let Err(error) = validation_result {
            assert!(error.to_string().contains("Invalid tracing_level"));
        }
    }

    #[test]
    fn test_api_key_is_hidden() {
        let mut config = ApplicationConfig::default();
        config.llm.api_key = Some("sk-very-secret".to_string());

        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-very-secret"));

        let toml_string = toml::to_string(&config).unwrap_or_default();
        assert!(!toml_string.contains("sk-very-secret"));
        assert!(toml_string.contains("[llm]"));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let parsed: Result<ApplicationConfig, _> = toml::from_str(
            r#"
            [retry]
            max_retries = 5

            [llm]
            default_model = "gpt-4"
            "#,
        );
        assert!(parsed.is_ok(), "partial TOML should parse: {parsed:?}");

        if let Ok(config) = parsed {
            assert_eq!(config.retry.max_retries, 5);
            assert_eq!(config.retry.base_delay_ms, DEFAULT_RETRY_BASE_DELAY_MS);
            assert_eq!(config.llm.default_model, "gpt-4");
            assert_eq!(config.api.port, DEFAULT_API_PORT);
            assert!(config.validate().is_ok());
        }
    }
}
