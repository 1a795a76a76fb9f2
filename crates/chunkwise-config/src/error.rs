//! Configuration error types

use thiserror::Error;

/// Why a configuration could not be loaded or accepted
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid URL: {url}")]
    InvalidUrl { url: String },

    #[error("Invalid port: {port}")]
    InvalidPort { port: u16 },

    /// A required string was empty or whitespace
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Value {value} is out of range for {field} (expected {min}-{max})")]
    OutOfRange {
        field: String,
        value: u64,
        min: u64,
        max: u64,
    },

    /// Model token limits that leave no room for input
    #[error("Invalid model profile: {reason}")]
    InvalidModelProfile { reason: String },

    /// A value that is well-formed but unusable, alone or next to another
    #[error("Invalid {field}: {reason}")]
    Invalid { field: String, reason: String },

    #[error("TOML parsing error: {0}")]
    TomlParsing(#[from] toml::de::Error),

    #[error("YAML parsing error: {0}")]
    YamlParsing(#[from] serde_yaml::Error),

    /// The config file could not be read
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConfigError {
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;
