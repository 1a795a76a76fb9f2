//! Dual logging: a daily rolling file plus stderr, both non-blocking

use chunkwise_config::TelemetryConfig;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::MakeWriterExt;

const LOG_FILE_PREFIX: &str = "chunkwise.log";

/// Flushes buffered log lines when dropped; hold it until `main` returns
#[must_use = "logs are lost once the guards are dropped"]
pub struct LogGuards {
    _file: WorkerGuard,
    _stderr: WorkerGuard,
}

/// Install the global subscriber
///
/// `RUST_LOG` wins over the configured level. Stdout is left alone so it can
/// carry the summary.
///
/// # Errors
/// Returns an error when the log directory cannot be created
pub fn init_logging(telemetry: &TelemetryConfig, log_dir: &Path) -> std::io::Result<LogGuards> {
    std::fs::create_dir_all(log_dir)?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, log_dir, LOG_FILE_PREFIX);
    let (file_writer, file_guard): (NonBlocking, WorkerGuard) =
        tracing_appender::non_blocking(file_appender);
    let (stderr_writer, stderr_guard): (NonBlocking, WorkerGuard) =
        tracing_appender::non_blocking(std::io::stderr());
    let writer = file_writer.and(stderr_writer);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&telemetry.tracing_level));

    if telemetry.json_logs {
        tracing_subscriber::fmt()
            .json()
            .with_writer(writer)
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_ansi(false)
            .with_writer(writer)
            .with_env_filter(filter)
            .init();
    }

    Ok(LogGuards {
        _file: file_guard,
        _stderr: stderr_guard,
    })
}

/// `--log-dir`, then `telemetry.log_dir`, then the platform default
pub fn resolve_log_dir(cli: Option<PathBuf>, telemetry: &TelemetryConfig) -> PathBuf {
    cli.or_else(|| telemetry.log_dir.as_ref().map(PathBuf::from))
        .unwrap_or_else(default_log_dir)
}

/// Get the default log directory based on the operating system
pub fn default_log_dir() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        // %LOCALAPPDATA%\chunkwise\logs
        std::env::var_os("LOCALAPPDATA").map_or_else(
            || PathBuf::from("logs"),
            |local| PathBuf::from(local).join("chunkwise").join("logs"),
        )
    }

    #[cfg(target_os = "macos")]
    {
        // ~/Library/Logs/chunkwise
        dirs::home_dir().map_or_else(
            || PathBuf::from("logs"),
            |home| home.join("Library").join("Logs").join("chunkwise"),
        )
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        let system_log_dir = Path::new("/var/log/chunkwise");

        if system_log_dir.exists() && is_writable(system_log_dir) {
            system_log_dir.to_path_buf()
        } else if let Some(data_dir) = dirs::data_dir() {
            // ~/.local/share/chunkwise/logs
            data_dir.join("chunkwise").join("logs")
        } else if let Some(home) = dirs::home_dir() {
            home.join(".chunkwise").join("logs")
        } else {
            PathBuf::from("logs")
        }
    }
}

#[cfg(not(any(target_os = "windows", target_os = "macos")))]
fn is_writable(path: &Path) -> bool {
    tempfile::tempfile_in(path).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_log_dir_wins() {
        let telemetry = TelemetryConfig {
            log_dir: Some("/from/config".to_string()),
            ..TelemetryConfig::default()
        };
        assert_eq!(
            resolve_log_dir(Some(PathBuf::from("/from/cli")), &telemetry),
            PathBuf::from("/from/cli")
        );
        assert_eq!(
            resolve_log_dir(None, &telemetry),
            PathBuf::from("/from/config")
        );
    }

    #[test]
    fn test_default_log_dir_is_named_for_the_app() {
        let dir = resolve_log_dir(None, &TelemetryConfig::default());
        assert_eq!(dir, default_log_dir());
        assert!(
            dir.to_string_lossy().contains("chunkwise") || dir == Path::new("logs"),
            "{}",
            dir.display()
        );
    }
}
