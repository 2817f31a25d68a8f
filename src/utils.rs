use chrono::Local;
use std::fmt::{self, Display};
use std::fs::OpenOptions;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::subscriber::DefaultGuard;
use tracing::{error, info};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use crate::error::EtlError;

/// `YYYY-MM-DD HH:MM:SS -` in local time, no sub-second part
struct LogTimestamp;

impl FormatTime for LogTimestamp {
    fn format_time(&self, w: &mut Writer<'_>) -> fmt::Result {
        write!(w, "{} -", Local::now().format("%Y-%m-%d %H:%M:%S"))
    }
}

/// Keeps the pipeline's subscriber installed; logging stops when dropped.
pub struct LoggingGuard {
    _default: DefaultGuard,
    log_path: PathBuf,
}

impl LoggingGuard {
    pub fn log_path(&self) -> &Path {
        &self.log_path
    }
}

/// Log to stdout and append to `log_path`. Level comes from `RUST_LOG`, default `info`.
pub fn init_logging(log_path: &Path) -> Result<LoggingGuard, EtlError> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
        .map_err(|e| EtlError::io(log_path, e))?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_timer(LogTimestamp)
                .with_target(false)
                .with_writer(std::io::stdout),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_timer(LogTimestamp)
                .with_target(false)
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        );

    Ok(LoggingGuard {
        _default: tracing::subscriber::set_default(subscriber),
        log_path: log_path.to_path_buf(),
    })
}

/// Run an async operation and log whether it completed.
/// The result is passed through untouched.
pub async fn log_completion<T, E, F, Fut>(name: &str, operation: F) -> Result<T, E>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let result = operation().await;
    report_completion(name, &result);
    result
}

/// Blocking counterpart of [`log_completion`]
pub fn log_completion_sync<T, E, F>(name: &str, operation: F) -> Result<T, E>
where
    F: FnOnce() -> Result<T, E>,
    E: Display,
{
    let result = operation();
    report_completion(name, &result);
    result
}

fn report_completion<T, E: Display>(name: &str, result: &Result<T, E>) {
    match result {
        Ok(_) => info!("The {} function has been executed successfully...", name),
        Err(e) => error!("The {} function failed to execute. Error: {}", name, e),
    }
}
