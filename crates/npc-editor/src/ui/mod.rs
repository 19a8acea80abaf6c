//! Front-end support shared by the CLI and the terminal editor.
//!
//! Holds the captured log model. Rendering lives in the front-end crates;
//! this module has no terminal dependencies.

pub mod tracing;

use serde::{Deserialize, Serialize};

/// Maximum log lines kept in memory.
pub const MAX_LOG_LINES: usize = 2000;
/// Trim to this many when the cap is exceeded.
pub const LOG_TRIM_TO: usize = 1200;

/// A single log line captured from tracing.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LogLine {
    pub time: String,
    pub level: LogLevel,
    pub message: String,
}

/// Log severity level (mirrors tracing levels), ordered by severity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Short fixed-width label for display.
    pub fn label(self) -> &'static str {
        match self {
            Self::Trace => "TRACE",
            Self::Debug => "DEBUG",
            Self::Info => "INFO ",
            Self::Warn => "WARN ",
            Self::Error => "ERROR",
        }
    }
}

/// Append lines, dropping the oldest once [`MAX_LOG_LINES`] is exceeded.
pub fn append_logs(logs: &mut Vec<LogLine>, lines: Vec<LogLine>) {
    logs.extend(lines);
    if logs.len() > MAX_LOG_LINES {
        let drop = logs.len() - LOG_TRIM_TO;
        logs.drain(..drop);
    }
}
