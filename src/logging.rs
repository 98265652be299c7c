//! Logging initialization
//!
//! Console output plus a non-blocking file writer under a `logs` directory
//! next to the executable. An existing log file is rotated by renaming it
//! with its own timestamp before the new session starts writing.

use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::Result;
use lazy_static::lazy_static;
use tracing::info;
use tracing_appender::non_blocking;
use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry,
};

const LOG_FILE_NAME: &str = "bookwatch.log";

// Keeps the non-blocking writer alive for the process lifetime.
lazy_static! {
    static ref LOG_GUARDS: Mutex<Vec<non_blocking::WorkerGuard>> = Mutex::new(Vec::new());
}

/// Log directory next to the executable, falling back to the working
/// directory.
pub fn log_directory() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(std::path::Path::to_path_buf))
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_default())
        .join("logs")
}

/// Renames an existing log file with its modification timestamp so each
/// run starts a fresh file without losing the previous one.
fn rotate_existing_log(log_dir: &std::path::Path) -> Result<()> {
    let current = log_dir.join(LOG_FILE_NAME);
    if !current.exists() {
        return Ok(());
    }
    let metadata = std::fs::metadata(&current)?;
    let modified = metadata
        .modified()
        .unwrap_or_else(|_| std::time::SystemTime::now());
    let stamp: chrono::DateTime<chrono::Utc> = modified.into();
    let rotated = log_dir.join(format!(
        "bookwatch.{}.log",
        stamp.format("%Y%m%dT%H%M%S")
    ));
    std::fs::rename(&current, &rotated)?;
    Ok(())
}

/// Initializes console and file logging. `RUST_LOG` overrides the default
/// `info` level.
pub fn init_logging() -> Result<()> {
    let log_dir = log_directory();
    std::fs::create_dir_all(&log_dir)?;
    rotate_existing_log(&log_dir)?;

    let file_appender = tracing_appender::rolling::never(&log_dir, LOG_FILE_NAME);
    let (file_writer, guard) = non_blocking(file_appender);
    if let Ok(mut guards) = LOG_GUARDS.lock() {
        guards.push(guard);
    }

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    Registry::default()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .with(fmt::layer().with_writer(file_writer).with_ansi(false))
        .try_init()?;

    info!(log_dir = %log_dir.display(), "logging initialized");
    Ok(())
}
