use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

const LOG_FILE_NAME: &str = "particle-field.log";

/// Keeps the background log writer alive; drop it last
pub struct LoggingGuard {
    _file_guard: Option<tracing_appender::non_blocking::WorkerGuard>,
    log_file: Option<PathBuf>,
}

impl LoggingGuard {
    /// Path of the log file when logging to disk
    pub fn log_file(&self) -> Option<&Path> {
        self.log_file.as_deref()
    }
}

/// Where log output should go
pub enum LogTarget {
    /// Append to a file in this directory (the terminal belongs to the UI)
    File(PathBuf),
    Stderr,
}

impl LogTarget {
    /// Default log directory, e.g. `~/.cache/particle-field`
    pub fn default_dir() -> PathBuf {
        dirs::cache_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("particle-field")
    }
}

/// Filter from `RUST_LOG`, falling back to `default_level`
fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

/// Initialize the global tracing subscriber
pub fn init_logging(target: LogTarget, default_level: &str) -> Result<LoggingGuard> {
    match target {
        LogTarget::File(dir) => {
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("Failed to create log directory: {}", dir.display()))?;

            let appender = tracing_appender::rolling::never(&dir, LOG_FILE_NAME);
            let (writer, guard) = tracing_appender::non_blocking(appender);

            let file_layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true);

            tracing_subscriber::registry()
                .with(env_filter(default_level))
                .with(file_layer)
                .try_init()
                .context("Failed to install tracing subscriber")?;

            Ok(LoggingGuard {
                _file_guard: Some(guard),
                log_file: Some(dir.join(LOG_FILE_NAME)),
            })
        }
        LogTarget::Stderr => {
            let console_layer = tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false);

            tracing_subscriber::registry()
                .with(env_filter(default_level))
                .with(console_layer)
                .try_init()
                .context("Failed to install tracing subscriber")?;

            Ok(LoggingGuard {
                _file_guard: None,
                log_file: None,
            })
        }
    }
}
