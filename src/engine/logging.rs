//! Log setup for the interactive binary
//!
//! The TUI owns stdout, so events go to a daily rolling file in the state
//! directory through a non-blocking writer. `RUST_LOG` overrides the
//! configured level.

use crate::engine::config::LoggingConfig;
use std::fs;
use std::io;
use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{InitError, RollingFileAppender, Rotation};
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Error, Debug)]
pub enum LoggingError {
    #[error("Failed to create log directory: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to open log file: {0}")]
    Appender(#[from] InitError),

    #[error("Failed to install log subscriber: {0}")]
    Subscriber(#[from] TryInitError),
}

/// Level used for clipdeck targets given the config and `-v` count
pub fn effective_level(configured: &str, verbosity: u8) -> &str {
    match verbosity {
        0 => configured,
        1 => "debug",
        _ => "trace",
    }
}

/// Install the global subscriber. Keep the returned guard alive for the
/// lifetime of the process or buffered lines are lost on exit.
pub fn init(config: &LoggingConfig, verbosity: u8) -> Result<WorkerGuard, LoggingError> {
    let dir = config.log_dir();
    fs::create_dir_all(&dir)?;

    let appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("clipdeck")
        .filename_suffix("log")
        .build(&dir)?;
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let level = effective_level(&config.level, verbosity);
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("clipdeck={level},warn")));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_thread_names(true),
        )
        .try_init()?;

    tracing::info!(dir = %dir.display(), level, "Logging initialized");
    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_level() {
        assert_eq!(effective_level("warn", 0), "warn");
        assert_eq!(effective_level("warn", 1), "debug");
        assert_eq!(effective_level("info", 3), "trace");
    }
}
