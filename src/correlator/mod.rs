//! Request correlation subsystem.
//!
//! # Data Flow
//! ```text
//! begin_request(meta)
//!     → id.rs (startup timestamp + counter)
//!     → pending table insert, timeout task armed
//!
//! log(Some(id), event)   → appended to the pending buffer (arrival order)
//! log(stale/None, event) → output dispatcher, standalone
//!
//! complete_request(id) ┐
//! timeout fires        ├→ DashMap::remove (first caller wins)
//! drain()              ┘   → FinishedBlock → output dispatcher
//! ```
//!
//! # Design Decisions
//! - The pending table belongs to one `Correlator`; no process globals
//! - Removal from the table is the only flush gate, so completion, timeout
//!   and drain can race freely
//! - Timer tasks hold a `Weak` handle and never keep a dropped correlator alive
//! - No lock is held while rendering or persisting a block

pub mod id;
pub mod pending;

pub use id::{CorrelationId, IdGenerator};
pub use pending::{FinishedBlock, Outcome, RequestMeta};

use dashmap::DashMap;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::time::Instant;

use crate::config::CorrelatorConfig;
use crate::event::LogEvent;
use crate::observability::metrics;
use crate::output::Dispatcher;
use pending::PendingRequest;

/// Buffers events per request and flushes each request exactly once.
#[derive(Clone)]
pub struct Correlator {
    inner: Arc<Inner>,
}

struct Inner {
    ids: IdGenerator,
    pending: DashMap<CorrelationId, PendingRequest>,
    timeout: Duration,
    dispatcher: Dispatcher,
}

impl Correlator {
    /// Create a correlator from configuration.
    pub fn new(dispatcher: Dispatcher, config: &CorrelatorConfig) -> Self {
        Self::with_timeout(dispatcher, Duration::from_secs(config.timeout_secs))
    }

    /// Create a correlator with an explicit per-request timeout.
    pub fn with_timeout(dispatcher: Dispatcher, timeout: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                ids: IdGenerator::new(),
                pending: DashMap::new(),
                timeout,
                dispatcher,
            }),
        }
    }

    /// Start tracking a request and arm its timeout.
    pub fn begin_request(&self, meta: RequestMeta) -> CorrelationId {
        let deadline = Instant::now() + self.inner.timeout;
        let id = self.inner.ids.next_id();

        tracing::trace!(
            correlation_id = %id,
            method = %meta.method,
            url = %meta.url,
            "Request tracking started"
        );

        self.inner.pending.insert(id.clone(), PendingRequest::new(meta));
        metrics::record_request_begun();
        metrics::record_pending(self.inner.pending.len());

        self.arm_timeout(&id, deadline);
        id
    }

    /// Buffer `event` under `id` if that request is still pending, otherwise
    /// dispatch it standalone.
    pub fn log(&self, id: Option<&CorrelationId>, event: LogEvent) {
        if let Some(id) = id {
            if let Some(mut entry) = self.inner.pending.get_mut(id) {
                entry.events.push(event);
                return;
            }
            tracing::debug!(
                correlation_id = %id,
                kind = %event.kind(),
                "Event for a finished request, dispatching standalone"
            );
        }
        metrics::record_standalone_event();
        self.inner.dispatcher.dispatch_event(&event);
    }

    /// Finish a pending request with `outcome`.
    ///
    /// Returns `false` without side effects when the request was already
    /// flushed or never existed.
    pub fn complete_request(&self, id: &CorrelationId, outcome: Outcome) -> bool {
        let Some((id, mut pending)) = self.inner.pending.remove(id) else {
            tracing::debug!(correlation_id = %id, "Completion for unknown or finished request ignored");
            return false;
        };
        pending.cancel_timer();
        self.inner.flush(pending.finish(id, outcome));
        true
    }

    /// Flush every pending request as aborted. Returns how many were flushed.
    pub fn drain(&self) -> usize {
        let ids: Vec<CorrelationId> = self
            .inner
            .pending
            .iter()
            .map(|entry| entry.key().clone())
            .collect();

        let mut drained = 0;
        for id in ids {
            if let Some((id, mut pending)) = self.inner.pending.remove(&id) {
                pending.cancel_timer();
                self.inner.flush(pending.finish(id, Outcome::aborted()));
                drained += 1;
            }
        }

        if drained > 0 {
            tracing::info!(drained, "Drained pending requests");
        }
        drained
    }

    /// Number of requests waiting for an outcome.
    pub fn pending_count(&self) -> usize {
        self.inner.pending.len()
    }

    pub fn is_pending(&self, id: &CorrelationId) -> bool {
        self.inner.pending.contains_key(id)
    }

    pub fn timeout(&self) -> Duration {
        self.inner.timeout
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.inner.dispatcher
    }

    /// Spawn the timer that expires `id` at `deadline`.
    ///
    /// The deadline is fixed before spawning; the task may first be polled
    /// arbitrarily later.
    fn arm_timeout(&self, id: &CorrelationId, deadline: Instant) {
        let Ok(runtime) = Handle::try_current() else {
            tracing::warn!(correlation_id = %id, "No tokio runtime, request timeout not armed");
            return;
        };

        let inner: Weak<Inner> = Arc::downgrade(&self.inner);
        let timer_id = id.clone();
        let timer = runtime.spawn(async move {
            tokio::time::sleep_until(deadline).await;
            if let Some(inner) = inner.upgrade() {
                inner.expire(&timer_id);
            }
        });

        // The entry may already be gone if completion beat us here.
        match self.inner.pending.get_mut(id) {
            Some(mut entry) => entry.timer = Some(timer),
            None => timer.abort(),
        }
    }
}

impl Inner {
    fn expire(&self, id: &CorrelationId) {
        if let Some((id, pending)) = self.pending.remove(id) {
            tracing::warn!(
                correlation_id = %id,
                method = %pending.meta.method,
                url = %pending.meta.url,
                buffered = pending.events.len(),
                "Request timed out before completion"
            );
            self.flush(pending.finish(id, Outcome::timed_out()));
        }
    }

    fn flush(&self, block: FinishedBlock) {
        metrics::record_block_flushed(block.outcome.label());
        metrics::record_pending(self.pending.len());
        self.dispatcher.dispatch_block(&block);
    }
}
