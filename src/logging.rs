//! Tracing subscriber setup for the command-line front end.
//!
//! Stdout carries the JSON report, so console logs always go to stderr. A
//! daily-rolling file is added when [`AppConfig::log_dir`] is set.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::AppConfig;

const LOG_FILE_PREFIX: &str = "tutor-predict.log";

/// Keeps the file writer flushing until dropped.
pub struct FileLogGuard {
    _guard: WorkerGuard,
}

fn env_filter(log_level: &str) -> EnvFilter {
    EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"))
}

fn file_writer(log_dir: &Path) -> std::io::Result<(tracing_appender::non_blocking::NonBlocking, WorkerGuard)> {
    std::fs::create_dir_all(log_dir)?;
    let appender = RollingFileAppender::new(Rotation::DAILY, log_dir, LOG_FILE_PREFIX);
    Ok(tracing_appender::non_blocking(appender))
}

/// Install the global subscriber. Hold the returned guard for the life of
/// the process when file logging is on.
pub fn init_tracing(config: &AppConfig) -> Option<FileLogGuard> {
    let stderr_layer = fmt::layer().with_writer(std::io::stderr).with_target(true);

    let file = config.log_dir.as_deref().and_then(|dir| match file_writer(dir) {
        Ok(writer) => Some(writer),
        Err(err) => {
            eprintln!("failed to open log directory {}: {err}", dir.display());
            None
        }
    });

    match file {
        Some((writer, guard)) => {
            let file_layer = fmt::layer().with_writer(writer).with_ansi(false).with_target(true);
            tracing_subscriber::registry()
                .with(env_filter(&config.log_level))
                .with(stderr_layer)
                .with(file_layer)
                .init();
            Some(FileLogGuard { _guard: guard })
        }
        None => {
            tracing_subscriber::registry()
                .with(env_filter(&config.log_level))
                .with(stderr_layer)
                .init();
            None
        }
    }
}
