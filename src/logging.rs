use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingConfig;
use crate::utils::error::{AppError, Result};

/// Installs the global subscriber: stdout plus an append-only log file.
///
/// The file is never rotated. Keep the returned guard alive until exit or
/// buffered lines are lost.
pub fn init_logging(config: &LoggingConfig) -> Result<WorkerGuard> {
    std::fs::create_dir_all(Path::new(&config.directory))?;

    let file_appender = tracing_appender::rolling::never(&config.directory, &config.file);
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.filter))
        .map_err(|e| AppError::Internal(format!("Invalid log filter '{}': {}", config.filter, e)))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .with(fmt::layer().with_target(false).with_ansi(false).with_writer(file_writer))
        .try_init()
        .map_err(|e| AppError::Internal(format!("Failed to install log subscriber: {}", e)))?;

    Ok(guard)
}
