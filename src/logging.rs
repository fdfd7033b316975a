//! Rotating log file for one pipeline invocation
//!
//! Events go to `<dir>/pdf-pager.<timestamp>.log`, rotated every minute with
//! the current file and one backup kept. The subscriber is installed for the
//! current thread only and removed again when the [`LogGuard`] is dropped.

use std::path::Path;
use tracing::subscriber::DefaultGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::EnvFilter;
use crate::error::{Error, Result};

/// Filename prefix of the rotating log
pub const LOG_PREFIX: &str = "pdf-pager";

/// Current file plus one backup
const MAX_LOG_FILES: usize = 2;

/// Keeps the log subscriber installed while alive
pub struct LogGuard {
    _default: DefaultGuard,
}

/// Install the rotating file subscriber for this invocation
///
/// The level filter comes from `RUST_LOG` and defaults to `debug`.
pub fn init(log_dir: &Path) -> Result<LogGuard> {
    std::fs::create_dir_all(log_dir)
        .map_err(|e| Error::Log(format!("{}: {}", log_dir.display(), e)))?;

    let appender = RollingFileAppender::builder()
        .rotation(Rotation::MINUTELY)
        .filename_prefix(LOG_PREFIX)
        .filename_suffix("log")
        .max_log_files(MAX_LOG_FILES)
        .build(log_dir)
        .map_err(|e| Error::Log(e.to_string()))?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(appender)
        .with_ansi(false)
        .with_target(false)
        .finish();

    Ok(LogGuard {
        _default: tracing::subscriber::set_default(subscriber),
    })
}
