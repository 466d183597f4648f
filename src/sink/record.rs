//! Flattened, persisted records and their identifiers.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::path::Path;
use std::sync::{Mutex, PoisonError};

use crate::correlator::FinishedBlock;
use crate::event::{Fields, LogEvent};

/// One persisted entry: a finished request or a standalone event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// `{iso_second}-{seq}`, sortable as a string.
    pub id: String,
    #[serde(flatten)]
    pub body: Fields,
}

/// Largest sequence number that fits the zero-padded width.
const SEQ_MAX: u64 = 999_999_999;

/// Assigns `{iso_second}-{seq:09}` identifiers.
///
/// The sequence restarts at zero whenever the second changes. If the wall
/// clock steps backwards, ids keep counting within the last seen second so
/// they never sort before an earlier id. A second that exhausts the sequence
/// width moves on to the following second.
#[derive(Debug)]
pub struct RecordIdGenerator {
    state: Mutex<IdState>,
}

#[derive(Debug)]
struct IdState {
    second: i64,
    stamp: String,
    seq: u64,
}

impl RecordIdGenerator {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(IdState {
                second: i64::MIN,
                stamp: String::new(),
                seq: 0,
            }),
        }
    }

    pub fn next_id(&self) -> String {
        self.next_at(Utc::now())
    }

    pub fn next_at(&self, now: DateTime<Utc>) -> String {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if now.timestamp() > state.second {
            state.enter(now);
        } else if state.seq < SEQ_MAX {
            state.seq += 1;
        } else {
            match DateTime::<Utc>::from_timestamp(state.second.saturating_add(1), 0) {
                Some(next) => state.enter(next),
                None => state.seq += 1,
            }
        }
        format!("{}-{:09}", state.stamp, state.seq)
    }
}

impl IdState {
    fn enter(&mut self, second: DateTime<Utc>) {
        self.second = second.timestamp();
        self.stamp = second.to_rfc3339_opts(SecondsFormat::Secs, true);
        self.seq = 0;
    }
}

impl Default for RecordIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// Strip `root` from a source location, leaving it unchanged if it does not
/// start with `root`.
pub fn relativize(source: &str, root: Option<&Path>) -> String {
    root.and_then(|root| Path::new(source).strip_prefix(root).ok())
        .map(|relative| relative.display().to_string())
        .unwrap_or_else(|| source.to_string())
}

/// Flatten a standalone or buffered event.
pub fn event_body(event: &LogEvent, root: Option<&Path>) -> Fields {
    let mut body = Fields::new();
    body.insert("type".into(), json!(event.kind()));
    body.insert("level".into(), json!(event.level()));
    body.insert(
        "timestamp".into(),
        json!(event.timestamp().to_rfc3339_opts(SecondsFormat::Millis, true)),
    );
    match event.message() {
        Some(message) => {
            body.insert("message".into(), json!(message));
            body.insert("raw".into(), json!(true));
        }
        None => {
            body.insert("fields".into(), Value::Object(event.fields().clone()));
        }
    }
    if let Some(duration) = event.duration_ms() {
        body.insert("duration_ms".into(), json!(duration));
    }
    if let Some(source) = event.source() {
        body.insert("source".into(), json!(relativize(source, root)));
    }
    body
}

/// Flatten a finished request with its buffered events under `logs`.
pub fn block_body(block: &FinishedBlock, root: Option<&Path>) -> Fields {
    let mut headers = Fields::new();
    for (name, value) in &block.meta.headers {
        match headers.get_mut(name) {
            Some(Value::String(existing)) => {
                existing.push_str(", ");
                existing.push_str(value);
            }
            _ => {
                headers.insert(name.clone(), json!(value));
            }
        }
    }

    let logs: Vec<Value> = block
        .events
        .iter()
        .map(|event| Value::Object(event_body(event, root)))
        .collect();

    let mut body = Fields::new();
    body.insert("type".into(), json!("server/request"));
    body.insert("request_id".into(), json!(block.id.as_str()));
    body.insert("level".into(), json!(block.level()));
    body.insert(
        "timestamp".into(),
        json!(block.meta.received_at.to_rfc3339_opts(SecondsFormat::Millis, true)),
    );
    body.insert("method".into(), json!(block.meta.method.to_uppercase()));
    body.insert("url".into(), json!(block.meta.url));
    body.insert("http_version".into(), json!(block.meta.http_version));
    body.insert("headers".into(), Value::Object(headers));
    body.insert("outcome".into(), json!(block.outcome.label()));
    body.insert("status_code".into(), json!(block.outcome.status()));
    body.insert("timed_out".into(), json!(block.outcome.is_timed_out()));
    body.insert("duration_ms".into(), json!(block.elapsed_ms()));
    body.insert("logs".into(), Value::Array(logs));
    body
}
