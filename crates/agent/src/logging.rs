//! Tracing setup for the agent binary
//!
//! JSON lines always go to stdout. With a log file configured they are also
//! written to a rolling file through a non-blocking writer.

use crate::config::{LogConfig, LogRotation};
use anyhow::{Context, Result};
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install the global subscriber
///
/// The returned guard flushes the file writer on drop and must be held
/// until the process exits.
pub fn init(config: &LogConfig) -> Result<Option<WorkerGuard>> {
    let filter = filter(std::env::var(EnvFilter::DEFAULT_ENV).ok(), &config.level)?;

    let (file_layer, guard) = match &config.file {
        Some(path) => {
            let appender = rolling_appender(path, config.rotation, config.max_files)?;
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().json().with_ansi(false).with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json())
        .with(file_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(guard)
}

/// `RUST_LOG` wins over the configured level when it is set
pub fn filter(env_directives: Option<String>, level: &str) -> Result<EnvFilter> {
    let directives = env_directives
        .filter(|d| !d.trim().is_empty())
        .unwrap_or_else(|| level.to_string());
    EnvFilter::try_new(&directives).with_context(|| format!("Invalid log filter {directives:?}"))
}

/// Rolling appender writing `path`, rotated files get a date suffix
pub fn rolling_appender(
    path: &Path,
    rotation: LogRotation,
    max_files: usize,
) -> Result<RollingFileAppender> {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .with_context(|| format!("Log file {} has no file name", path.display()))?;
    let directory = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };

    let rotation = match rotation {
        LogRotation::Minutely => Rotation::MINUTELY,
        LogRotation::Hourly => Rotation::HOURLY,
        LogRotation::Daily => Rotation::DAILY,
        LogRotation::Never => Rotation::NEVER,
    };

    RollingFileAppender::builder()
        .rotation(rotation)
        .filename_prefix(file_name)
        .max_log_files(max_files)
        .build(directory)
        .with_context(|| format!("Failed to open log file in {}", directory.display()))
}
