//! Global initialization utilities for the application

use std::sync::Once;

static INIT: Once = Once::new();

/// Initialize the application environment
///
/// Loads variables from a `.env` file (current directory or any parent) so
/// `CHUNKWISE_*` settings and the provider API key can live outside the shell.
///
/// Safe to call multiple times - will only run once
pub fn initialize_environment() {
    INIT.call_once(|| {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!("Loaded environment from {}", path.display());
        }
    });
}
