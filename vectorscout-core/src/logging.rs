//! Logging infrastructure for vectorscout
//!
//! Logs are written to `~/.local/state/vectorscout/vectorscout.log` following XDG
//! standards. Nothing is written to stdout so CLI output stays machine-readable.

use crate::config::{Config, LoggingConfig};
use std::path::{Path, PathBuf};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

const LOG_FILE_NAME: &str = "vectorscout.log";

/// Initialize the logging system in the XDG state directory
///
/// Sets up tracing with:
/// - Daily rotated file output
/// - Configurable log level via config or RUST_LOG env var
pub fn init(config: &LoggingConfig) -> crate::error::Result<LoggingGuard> {
    init_in(config, &Config::state_dir())
}

/// Initialize the logging system writing into `log_dir`
pub fn init_in(config: &LoggingConfig, log_dir: &Path) -> crate::error::Result<LoggingGuard> {
    std::fs::create_dir_all(log_dir)?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, log_dir, LOG_FILE_NAME);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let file_layer = fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true)
        .with_file(true)
        .with_line_number(true);

    // A host may already have installed a subscriber; keep theirs.
    if tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .try_init()
        .is_err()
    {
        tracing::debug!("global subscriber already set, file logging not installed");
    }

    tracing::info!(
        log_dir = %log_dir.display(),
        level = %config.level,
        "Logging initialized"
    );

    Ok(LoggingGuard { _guard: guard })
}

/// Initialize logging for tests (logs to the test writer)
pub fn init_test() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .with_span_events(FmtSpan::CLOSE)
        .try_init();
}

/// Guard that keeps the logging system alive
///
/// When dropped, flushes any pending log writes.
pub struct LoggingGuard {
    _guard: tracing_appender::non_blocking::WorkerGuard,
}

/// Returns the log file path
pub fn log_file_path() -> PathBuf {
    Config::log_path()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_file_path() {
        let path = log_file_path();
        assert!(path.ends_with(LOG_FILE_NAME));
        assert!(path.parent().unwrap().ends_with("vectorscout"));
    }

    #[test]
    fn test_init_in_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let log_dir = dir.path().join("logs");
        let guard = init_in(&LoggingConfig::default(), &log_dir).unwrap();
        assert!(log_dir.is_dir());
        drop(guard);
    }
}
