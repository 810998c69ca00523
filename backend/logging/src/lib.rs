//! Structured logging for Argot.
//!
//! Subscriber setup with console output and daily-rotated JSON files,
//! per-dispatch command events, and sanitising of user text before it is
//! logged.

pub mod event_logger;
pub mod logger;
pub mod sanitize;

pub use event_logger::{CommandEvent, CommandEventLogger, CommandLogEntry};
pub use logger::init_logger;
pub use sanitize::sanitize_for_log;
