//! Tracing layer that captures log events into a [`LogBuffer`] for a
//! terminal front end.
//!
//! The layer writes [`LogLine`] entries into a buffer with its own mutex, so
//! logging from tokio workers never contends with the render loop's lock on
//! the editor state. The front end drains the buffer once per frame.

use std::sync::{Arc, Mutex};

use chrono::Local;
use tracing::Subscriber;
use tracing_subscriber::layer::Layer;
use tracing_subscriber::registry::LookupSpan;

use super::{LogLevel, LogLine, append_logs};

/// A shared buffer of pending log lines.
#[derive(Clone)]
pub struct LogBuffer(Arc<Mutex<Vec<LogLine>>>);

impl LogBuffer {
    fn new() -> Self {
        Self(Arc::new(Mutex::new(Vec::with_capacity(128))))
    }

    /// Drain all pending log lines from the buffer, returning them.
    pub fn drain(&self) -> Vec<LogLine> {
        let mut buf = self.0.lock().unwrap_or_else(|e| e.into_inner());
        std::mem::take(&mut *buf)
    }

    /// Move pending lines into a front end's log list, respecting the
    /// trim limits.
    pub fn flush_into(&self, logs: &mut Vec<LogLine>) {
        let lines = self.drain();
        if !lines.is_empty() {
            append_logs(logs, lines);
        }
    }
}

/// A [`tracing_subscriber::Layer`] that captures log events into
/// a [`LogBuffer`].
pub struct UiTracingLayer {
    buffer: LogBuffer,
    min_level: LogLevel,
}

impl UiTracingLayer {
    /// Create a layer that keeps `Info` and above, plus the buffer the front
    /// end drains.
    pub fn new() -> (Self, LogBuffer) {
        Self::with_min_level(LogLevel::Info)
    }

    /// Create a layer that drops events below `min_level`.
    pub fn with_min_level(min_level: LogLevel) -> (Self, LogBuffer) {
        let buffer = LogBuffer::new();
        (
            Self {
                buffer: buffer.clone(),
                min_level,
            },
            buffer,
        )
    }
}

impl<S: Subscriber + for<'a> LookupSpan<'a>> Layer<S> for UiTracingLayer {
    fn on_event(
        &self,
        event: &tracing::Event<'_>,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        let level = match *event.metadata().level() {
            tracing::Level::TRACE => LogLevel::Trace,
            tracing::Level::DEBUG => LogLevel::Debug,
            tracing::Level::INFO => LogLevel::Info,
            tracing::Level::WARN => LogLevel::Warn,
            tracing::Level::ERROR => LogLevel::Error,
        };
        if level < self.min_level {
            return;
        }

        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);

        let mut message = visitor.message;
        if !visitor.fields.is_empty() {
            let extras: Vec<String> = visitor
                .fields
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect();
            if message.is_empty() {
                message = extras.join(" ");
            } else {
                message = format!("{message} {{{}}}", extras.join(", "));
            }
        }

        let line = LogLine {
            time: Local::now().format("%H:%M:%S").to_string(),
            level,
            message,
        };

        if let Ok(mut buf) = self.buffer.0.lock() {
            append_logs(&mut buf, vec![line]);
        }
    }
}

/// Visitor that extracts the message and extra fields from a tracing event.
#[derive(Default)]
struct MessageVisitor {
    message: String,
    fields: Vec<(String, String)>,
}

impl tracing::field::Visit for MessageVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            let raw = format!("{value:?}");
            self.message = match raw.strip_prefix('"').and_then(|r| r.strip_suffix('"')) {
                Some(inner) => inner.to_string(),
                None => raw,
            };
        } else {
            self.fields
                .push((field.name().to_string(), format!("{value:?}")));
        }
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.fields
                .push((field.name().to_string(), value.to_string()));
        }
    }
}
