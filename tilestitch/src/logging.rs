//! Logging setup.
//!
//! Structured logging to a session log file and to stdout:
//! - Writes to `logs/tilestitch.log` (cleared on session start)
//! - Mirrors events to stdout in compact form
//! - Level defaults to `info` (`debug` when verbose); `RUST_LOG` overrides

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Keeps the non-blocking file writer alive.
///
/// Dropping this guard flushes and closes the log file.
pub struct LoggingGuard {
    _file_guard: WorkerGuard,
}

/// Installs the global subscriber.
///
/// Creates `log_dir` if needed and truncates `log_file` inside it.
///
/// # Errors
///
/// Returns an error if the directory or file cannot be prepared.
pub fn init_logging(
    log_dir: &Path,
    log_file: &str,
    verbose: bool,
) -> Result<LoggingGuard, io::Error> {
    prepare_log_file(log_dir, log_file)?;

    let file_appender = tracing_appender::rolling::never(log_dir, log_file);
    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking_file)
        .with_ansi(false)
        .with_target(true);

    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stdout)
        .with_ansi(true)
        .with_target(false)
        .compact();

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level(verbose)));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(stdout_layer)
        .init();

    Ok(LoggingGuard {
        _file_guard: file_guard,
    })
}

/// Creates the log directory and empties the log file.
pub fn prepare_log_file(log_dir: &Path, log_file: &str) -> Result<PathBuf, io::Error> {
    fs::create_dir_all(log_dir)?;
    let path = log_dir.join(log_file);
    fs::write(&path, "")?;
    Ok(path)
}

fn default_level(verbose: bool) -> &'static str {
    if verbose {
        "debug"
    } else {
        "info"
    }
}

/// Default log directory.
pub fn default_log_dir() -> &'static str {
    "logs"
}

/// Default log file name.
pub fn default_log_file() -> &'static str {
    "tilestitch.log"
}
