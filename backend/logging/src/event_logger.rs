//! Command Event Logger
//!
//! One structured event per dispatch outcome, on the `command_events` target.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::sanitize::sanitize_for_log;

/// Tracing target for command events.
pub const EVENT_TARGET: &str = "command_events";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CommandEvent {
    Executed {
        command: String,
        elapsed_ms: u64,
    },
    Rejected {
        command: String,
        /// Stable snake_case rejection kind.
        kind: String,
        message: String,
    },
    ConfirmationIssued {
        command: String,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct CommandLogEntry {
    pub invoker: u64,
    pub channel: u64,
    pub timestamp: DateTime<Utc>,
    /// Sanitised argument text.
    pub args: String,
    pub event: CommandEvent,
}

pub struct CommandEventLogger;

impl CommandEventLogger {
    /// Sanitise, stamp and emit `event`. The entry is returned for callers
    /// that also want to keep it.
    pub fn log_event(invoker: u64, channel: u64, raw_args: &str, mut event: CommandEvent) -> CommandLogEntry {
        if let CommandEvent::Rejected { message, .. } = &mut event {
            *message = sanitize_for_log(message);
        }

        let entry = CommandLogEntry {
            invoker,
            channel,
            timestamp: Utc::now(),
            args: sanitize_for_log(raw_args),
            event,
        };

        let json = serde_json::to_string(&entry).unwrap_or_default();
        info!(target: EVENT_TARGET, invoker, channel, event = %json, "command event");
        entry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_carries_sanitised_text() {
        let entry = CommandEventLogger::log_event(
            42,
            7,
            "hp\u{200B} 43",
            CommandEvent::Rejected {
                command: "editquest".into(),
                kind: "type_resolution_failed".into(),
                message: "bad\nvalue".into(),
            },
        );
        assert_eq!(entry.args, "hp\\u{200b} 43");
        assert!(matches!(&entry.event, CommandEvent::Rejected { message, .. } if message == "bad\\u{000a}value"));
    }

    #[test]
    fn events_serialise_with_type_tag() {
        let json = serde_json::to_value(CommandEvent::ConfirmationIssued { command: "resetme".into() }).unwrap();
        assert_eq!(json["type"], "confirmation_issued");
        assert_eq!(json["command"], "resetme");
    }
}
