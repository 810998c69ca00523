//! Structured Logger
//!
//! Console output for humans, NDJSON files for machines, level from the
//! configuration unless `RUST_LOG` says otherwise.

use std::path::Path;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// File name stem; the appender adds a `.YYYY-MM-DD` suffix.
pub const LOG_FILE_NAME: &str = "argot.log";

/// Initialize the global structured logger. Returns `false` when a global
/// subscriber was already installed.
pub fn init_logger<P: AsRef<Path>>(log_dir: P, level: &str) -> bool {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level));

    // Rolling file appender: writes NDJSON to `<dir>/argot.log.YYYY-MM-DD`
    let file_appender = RollingFileAppender::new(Rotation::DAILY, log_dir, LOG_FILE_NAME);

    let file_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_writer(file_appender)
        .with_ansi(false);

    // The console doubles as the chat surface in the CLI, so logs go to stderr.
    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_ansi(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .is_ok()
}
