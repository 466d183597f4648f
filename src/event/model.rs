//! Log event definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::event::{Fields, Payload};

/// Severity of a log event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Log,
    Info,
    Warn,
    Error,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Log => "log",
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
        }
    }

    /// Warnings and errors go to stderr, everything else to stdout.
    pub fn is_diagnostic(&self) -> bool {
        matches!(self, Level::Warn | Level::Error)
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single log event.
///
/// Built once through the consuming `with_*` methods and never mutated
/// afterwards. An event is *raw* when it carries a literal message (it was
/// logged from a string or an error) instead of structured fields.
#[derive(Debug, Clone, PartialEq)]
pub struct LogEvent {
    kind: String,
    level: Level,
    timestamp: DateTime<Utc>,
    fields: Fields,
    message: Option<String>,
    duration_ms: Option<u64>,
    source: Option<String>,
}

impl LogEvent {
    /// Create an empty event of the given kind, stamped now.
    pub fn new(kind: impl Into<String>, level: Level) -> Self {
        Self {
            kind: kind.into(),
            level,
            timestamp: Utc::now(),
            fields: Fields::new(),
            message: None,
            duration_ms: None,
            source: None,
        }
    }

    /// Attach a payload: messages make the event raw, fields are stored as-is.
    pub fn with_payload(mut self, payload: Payload) -> Self {
        match payload {
            Payload::Message(message) => self.message = Some(message),
            Payload::Fields(fields) => self.fields = fields,
        }
        self
    }

    pub fn with_fields(mut self, fields: Fields) -> Self {
        self.fields = fields;
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_duration_ms(mut self, duration_ms: u64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn level(&self) -> Level {
        self.level
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    /// Look up a single field.
    pub fn field(&self, name: &str) -> Option<&serde_json::Value> {
        self.fields.get(name)
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn is_raw(&self) -> bool {
        self.message.is_some()
    }

    pub fn duration_ms(&self) -> Option<u64> {
        self.duration_ms
    }

    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }
}
