// Logger initialization

use crate::types::{AppError, AppResult};
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "complaint_rag=debug,tower_http=debug";
const LOG_FILE_PREFIX: &str = "complaint-rag.log";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into())
}

/// Log to stderr, filtered by `RUST_LOG`.
pub fn init_logger() -> AppResult<()> {
    tracing_subscriber::registry()
        .with(env_filter())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init()
        .map_err(|e| AppError::Internal(format!("Failed to install logger: {}", e)))
}

/// Log to a daily rolling file under `log_dir`, used while the terminal UI owns the screen.
///
/// Keep the returned guard alive until exit or buffered lines are lost.
pub fn init_file_logger(log_dir: &Path) -> AppResult<WorkerGuard> {
    std::fs::create_dir_all(log_dir)?;
    let appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(env_filter())
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false),
        )
        .try_init()
        .map_err(|e| AppError::Internal(format!("Failed to install logger: {}", e)))?;

    Ok(guard)
}
