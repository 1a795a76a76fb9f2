//! Configuration source loading and composition

use crate::validation::Validate;
use crate::{ApplicationConfig, ConfigResult};
use std::path::{Path, PathBuf};

/// A layer that turns the configuration built so far into a new one
pub trait ConfigurationSource {
    /// Apply this source on top of `base`
    ///
    /// # Errors
    /// Returns configuration loading errors
    fn apply(&self, base: ApplicationConfig) -> ConfigResult<ApplicationConfig>;

    /// Get the name of this configuration source
    fn name(&self) -> &str;

    /// Get the priority of this source (higher number = applied later)
    fn priority(&self) -> u8;
}

/// `CHUNKWISE_*` environment overrides
pub struct EnvironmentSource;

impl ConfigurationSource for EnvironmentSource {
    fn apply(&self, base: ApplicationConfig) -> ConfigResult<ApplicationConfig> {
        Ok(base.with_env_overrides())
    }

    fn name(&self) -> &'static str {
        "environment"
    }

    fn priority(&self) -> u8 {
        100 // Environment variables override everything
    }
}

/// Load configuration from a TOML file
///
/// Missing sections and fields fall back to defaults, so the file replaces
/// whatever lower-priority layers produced.
pub struct TomlFileSource {
    path: PathBuf,
}

impl TomlFileSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl ConfigurationSource for TomlFileSource {
    fn apply(&self, _base: ApplicationConfig) -> ConfigResult<ApplicationConfig> {
        let content = std::fs::read_to_string(&self.path)?;
        let config: ApplicationConfig = toml::from_str(&content)?;
        Ok(config)
    }

    fn name(&self) -> &'static str {
        "toml_file"
    }

    fn priority(&self) -> u8 {
        50
    }
}

/// Load configuration from a YAML file
pub struct YamlFileSource {
    path: PathBuf,
}

impl YamlFileSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl ConfigurationSource for YamlFileSource {
    fn apply(&self, _base: ApplicationConfig) -> ConfigResult<ApplicationConfig> {
        let content = std::fs::read_to_string(&self.path)?;
        let config: ApplicationConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    fn name(&self) -> &'static str {
        "yaml_file"
    }

    fn priority(&self) -> u8 {
        50
    }
}

/// Pick a file source from the path's extension (`.yaml`/`.yml` or TOML)
pub fn file_source<P: AsRef<Path>>(path: P) -> Box<dyn ConfigurationSource> {
    let path = path.as_ref();
    match path.extension().and_then(|e| e.to_str()) {
        Some("yaml" | "yml") => Box::new(YamlFileSource::new(path)),
        _ => Box::new(TomlFileSource::new(path)),
    }
}

/// Type alias for configuration sources
type ConfigSources = Vec<Box<dyn ConfigurationSource>>;

/// Configuration loader that combines multiple sources
pub struct ConfigurationLoader {
    sources: ConfigSources,
}

impl ConfigurationLoader {
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
        }
    }

    #[must_use]
    pub fn add_source(mut self, source: Box<dyn ConfigurationSource>) -> Self {
        self.sources.push(source);
        self
    }

    /// Apply all sources over the defaults, lowest priority first
    ///
    /// A source that fails is skipped with a warning; the merged result
    /// must still validate.
    ///
    /// # Errors
    /// Returns configuration validation errors
    pub fn load(&self) -> ConfigResult<ApplicationConfig> {
        let mut config = ApplicationConfig::default();

        let mut sorted_sources = self.sources.iter().collect::<Vec<_>>();
        sorted_sources.sort_by_key(|source| source.priority());

        for source in sorted_sources {
            match source.apply(config.clone()) {
                Ok(applied) => {
                    tracing::debug!("Loaded configuration from source: {}", source.name());
                    config = applied;
                }
                Err(e) => {
                    tracing::warn!("Failed to load from source {}: {}", source.name(), e);
                }
            }
        }

        config.validate()?;
        Ok(config)
    }
}

impl Default for ConfigurationLoader {
    fn default() -> Self {
        Self::new()
    }
}
