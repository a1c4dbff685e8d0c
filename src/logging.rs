//! Logging setup for depot.
//!
//! Events go to stdout and to an append-only log file, so the history of
//! earlier runs is kept across restarts. `RUST_LOG` overrides the
//! configured level when set.

use std::fs::{self, File, OpenOptions};
use std::path::Path;
use std::sync::Arc;

use tracing::Level;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;
use crate::Result;

/// Configured level, falling back to `info` for unknown values.
fn resolve_level(level: &str) -> Level {
    level.trim().parse().unwrap_or(Level::INFO)
}

fn build_filter(level: &str) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(resolve_level(level).into())
        .from_env_lossy()
}

/// Open the log file for appending, creating it and its directory if needed.
fn open_log_file(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(OpenOptions::new().create(true).append(true).open(path)?)
}

/// Initialize logging to stdout and the configured log file.
pub fn init(config: &LoggingConfig) -> Result<()> {
    let log_file = Arc::new(open_log_file(Path::new(&config.file))?);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stdout.and(log_file))
                .with_ansi(false)
                .with_target(true),
        )
        .with(build_filter(&config.level))
        .init();

    tracing::debug!(file = %config.file, "Logging to file");
    Ok(())
}

/// Initialize console-only logging.
///
/// Used when the log file cannot be opened.
pub fn init_console_only(level: &str) {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .with(build_filter(level))
        .init();
}
