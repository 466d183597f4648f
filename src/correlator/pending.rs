//! Pending request state and the blocks it flushes into.

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::correlator::CorrelationId;
use crate::event::{Level, LogEvent};

/// Request line and headers captured on arrival.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestMeta {
    pub method: String,
    pub url: String,
    pub http_version: String,
    pub headers: Vec<(String, String)>,
    /// Monotonic arrival time, used for elapsed durations.
    pub arrived_at: Instant,
    /// Wall-clock arrival time, used for persisted records.
    pub received_at: DateTime<Utc>,
}

impl RequestMeta {
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            url: url.into(),
            http_version: "HTTP/1.1".to_string(),
            headers: Vec::new(),
            arrived_at: Instant::now(),
            received_at: Utc::now(),
        }
    }

    pub fn with_http_version(mut self, version: impl Into<String>) -> Self {
        self.http_version = version.into();
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// How a request ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// A response was produced.
    Responded {
        status: u16,
        at: Instant,
        /// Explicit duration, preferred over `at - arrived_at`.
        duration_ms: Option<u64>,
    },
    /// No completion arrived within the correlator timeout.
    TimedOut { at: Instant },
    /// The request was dropped before responding, or drained on shutdown.
    Aborted { at: Instant },
}

impl Outcome {
    pub fn responded(status: u16) -> Self {
        Outcome::Responded {
            status,
            at: Instant::now(),
            duration_ms: None,
        }
    }

    pub fn timed_out() -> Self {
        Outcome::TimedOut { at: Instant::now() }
    }

    pub fn aborted() -> Self {
        Outcome::Aborted { at: Instant::now() }
    }

    /// Record an explicit duration on a response; other outcomes are unchanged.
    pub fn with_duration_ms(self, duration: u64) -> Self {
        match self {
            Outcome::Responded { status, at, .. } => Outcome::Responded {
                status,
                at,
                duration_ms: Some(duration),
            },
            other => other,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Outcome::Responded { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn at(&self) -> Instant {
        match self {
            Outcome::Responded { at, .. } | Outcome::TimedOut { at } | Outcome::Aborted { at } => *at,
        }
    }

    pub fn is_timed_out(&self) -> bool {
        matches!(self, Outcome::TimedOut { .. })
    }

    pub fn level(&self) -> Level {
        match self {
            Outcome::Responded { .. } => Level::Info,
            Outcome::TimedOut { .. } | Outcome::Aborted { .. } => Level::Warn,
        }
    }

    /// Short name used for metric labels and persisted records.
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Responded { .. } => "responded",
            Outcome::TimedOut { .. } => "timeout",
            Outcome::Aborted { .. } => "aborted",
        }
    }
}

/// A request whose outcome is not known yet.
#[derive(Debug)]
pub(crate) struct PendingRequest {
    pub meta: RequestMeta,
    pub events: Vec<LogEvent>,
    pub timer: Option<JoinHandle<()>>,
}

impl PendingRequest {
    pub fn new(meta: RequestMeta) -> Self {
        Self {
            meta,
            events: Vec::new(),
            timer: None,
        }
    }

    /// Stop the timeout task; a no-op if it already fired.
    pub fn cancel_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }

    /// Convert into a block. The timer handle is dropped, not aborted, so a
    /// timeout task may finish itself.
    pub fn finish(self, id: CorrelationId, outcome: Outcome) -> FinishedBlock {
        FinishedBlock {
            id,
            meta: self.meta,
            outcome,
            events: self.events,
        }
    }
}

/// Immutable snapshot of a flushed request.
#[derive(Debug, Clone, PartialEq)]
pub struct FinishedBlock {
    pub id: CorrelationId,
    pub meta: RequestMeta,
    pub outcome: Outcome,
    /// Buffered events in arrival order.
    pub events: Vec<LogEvent>,
}

impl FinishedBlock {
    /// Explicit duration if recorded, otherwise outcome time minus arrival time.
    pub fn elapsed_ms(&self) -> u64 {
        if let Outcome::Responded {
            duration_ms: Some(duration),
            ..
        } = self.outcome
        {
            return duration;
        }
        let elapsed = self.outcome.at().saturating_duration_since(self.meta.arrived_at);
        u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
    }

    pub fn level(&self) -> Level {
        self.outcome.level()
    }
}
