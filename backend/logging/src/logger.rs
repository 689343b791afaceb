//! Structured Logger
//!
//! Console output plus a daily-rolling NDJSON file, filtered by `RUST_LOG`
//! or the configured level.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Files are named `scanchat.log.YYYY-MM-DD`.
pub const LOG_FILE_PREFIX: &str = "scanchat.log";

/// Keeps the file writer flushing. Hold it for the life of the process.
pub struct LoggerGuard {
    _file: WorkerGuard,
}

/// Initialize the global logger.
///
/// `json` switches the console layer to JSON; the file layer is always NDJSON.
/// Calling it twice leaves the first subscriber in place.
pub fn init_logger<P: AsRef<Path>>(log_dir: P, level: &str, json: bool) -> LoggerGuard {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let file_appender = RollingFileAppender::new(Rotation::DAILY, log_dir, LOG_FILE_PREFIX);
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer()
        .json()
        .with_writer(file_writer)
        .with_ansi(false);

    // Console goes to stderr so command output on stdout stays clean.
    let console_layer = if json {
        fmt::layer().json().with_writer(std::io::stderr).boxed()
    } else {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_ansi(true)
            .boxed()
    };

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init();

    LoggerGuard { _file: guard }
}
