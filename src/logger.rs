//! Per-call-site logging handle.
//!
//! A [`Logger`] is cheap to clone. Unbound loggers write immediately; a logger
//! bound to a [`RequestContext`] buffers its events until that request is
//! flushed.
//!
//! ```text
//! let log = Logger::new(correlator).with_source("src/jobs.rs");
//! log.info("job/start", "nightly");
//! log.bind(&ctx).time().info("db/call", fields);
//! ```

use std::panic::Location;
use tokio::time::Instant;

use crate::correlator::{CorrelationId, Correlator};
use crate::event::{Level, LogEvent, Payload};
use crate::http::RequestContext;

#[derive(Clone)]
pub struct Logger {
    correlator: Correlator,
    source: Option<String>,
    started: Option<Instant>,
    context: Option<CorrelationId>,
}

impl Logger {
    pub fn new(correlator: Correlator) -> Self {
        Self {
            correlator,
            source: None,
            started: None,
            context: None,
        }
    }

    /// Record `source` on every event instead of the call site.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// A copy whose events carry the milliseconds elapsed since this call.
    pub fn time(&self) -> Self {
        Self {
            started: Some(Instant::now()),
            ..self.clone()
        }
    }

    /// A copy whose events are buffered against the request in `ctx`.
    pub fn bind(&self, ctx: &RequestContext) -> Self {
        Self {
            context: Some(ctx.id().clone()),
            ..self.clone()
        }
    }

    pub fn correlation_id(&self) -> Option<&CorrelationId> {
        self.context.as_ref()
    }

    #[track_caller]
    pub fn log(&self, kind: &str, payload: impl Into<Payload>) {
        self.emit(Level::Log, kind, payload.into(), Location::caller());
    }

    #[track_caller]
    pub fn info(&self, kind: &str, payload: impl Into<Payload>) {
        self.emit(Level::Info, kind, payload.into(), Location::caller());
    }

    #[track_caller]
    pub fn warn(&self, kind: &str, payload: impl Into<Payload>) {
        self.emit(Level::Warn, kind, payload.into(), Location::caller());
    }

    #[track_caller]
    pub fn error(&self, kind: &str, payload: impl Into<Payload>) {
        self.emit(Level::Error, kind, payload.into(), Location::caller());
    }

    fn emit(&self, level: Level, kind: &str, payload: Payload, caller: &Location<'_>) {
        let source = match &self.source {
            Some(source) => source.clone(),
            None => format!("{}:{}", caller.file(), caller.line()),
        };

        let mut event = LogEvent::new(kind, level)
            .with_payload(payload)
            .with_source(source);
        if let Some(started) = self.started {
            event = event.with_duration_ms(started.elapsed().as_millis() as u64);
        }

        self.correlator.log(self.context.as_ref(), event);
    }
}
