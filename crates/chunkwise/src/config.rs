//! Configuration loading for the CLI

use anyhow::Context;
use chunkwise_config::ApplicationConfig;
use chunkwise_config::source::{ConfigurationLoader, EnvironmentSource, file_source};
use std::path::Path;

/// Environment variable naming a config file when `--config` is absent
pub const CONFIG_FILE_ENV: &str = "CHUNKWISE_CONFIG_FILE";

/// Defaults, then the config file, then `CHUNKWISE_*` variables
///
/// An explicit `config_file` must exist; the one named by
/// [`CONFIG_FILE_ENV`] is best effort.
///
/// # Errors
/// Returns an error when the named file is missing or the merged
/// configuration fails validation
pub fn load_config(config_file: Option<&Path>) -> anyhow::Result<ApplicationConfig> {
    let mut loader = ConfigurationLoader::new().add_source(Box::new(EnvironmentSource));

    if let Some(path) = config_file {
        anyhow::ensure!(
            path.is_file(),
            "config file '{}' does not exist",
            path.display()
        );
        loader = loader.add_source(file_source(path));
    } else if let Ok(path) = std::env::var(CONFIG_FILE_ENV) {
        loader = loader.add_source(file_source(path));
    }

    loader.load().context("invalid configuration")
}
