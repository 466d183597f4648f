//! Persistence sink subsystem.
//!
//! # Data Flow
//! ```text
//! Dispatcher (block or standalone event)
//!     → record.rs (flatten, assign {iso_second}-{seq} id)
//!     → SinkHandle::enqueue (unbounded channel, never blocks)
//!     → worker task → Sink::persist
//!         → on error: tracing::error! + metric, record dropped
//! ```
//!
//! # Design Decisions
//! - Best effort, at most once: no retries, no acknowledgements to callers
//! - Request handling never waits on persistence
//! - Console output is always on; a sink is an optional extra destination

pub mod file;
pub mod memory;
pub mod record;

pub use file::JsonLinesSink;
pub use memory::MemorySink;
pub use record::{Record, RecordIdGenerator};

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot};

use crate::config::SinkConfig;
use crate::event::Fields;
use crate::observability::metrics;

/// Errors raised by sinks.
#[derive(Debug, Error)]
pub enum SinkError {
    /// Underlying store I/O failed.
    #[error("Sink I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Record could not be encoded.
    #[error("Record serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Sink workers need a tokio runtime.
    #[error("No tokio runtime available for the sink worker")]
    NoRuntime,

    /// The store refused the record.
    #[error("Record rejected: {0}")]
    Rejected(String),
}

/// An external store for finished records.
#[async_trait]
pub trait Sink: Send + Sync {
    async fn persist(&self, record: &Record) -> Result<(), SinkError>;
}

/// Open the sink described by `config`, or `None` for console-only mode.
pub async fn connect(config: &SinkConfig) -> Result<Option<Arc<dyn Sink>>, SinkError> {
    if !config.enabled {
        return Ok(None);
    }
    let Some(path) = config.path.as_deref() else {
        tracing::warn!("Sink enabled without a path, persistence disabled");
        return Ok(None);
    };
    let sink = JsonLinesSink::open(path, config.collection.as_deref()).await?;
    Ok(Some(Arc::new(sink)))
}

enum Command {
    Persist(Record),
    Flush(oneshot::Sender<()>),
}

/// Fire-and-forget front of a sink worker.
///
/// Dropping the handle lets the worker persist what is queued and exit.
pub struct SinkHandle {
    tx: mpsc::UnboundedSender<Command>,
    ids: RecordIdGenerator,
}

impl SinkHandle {
    /// Spawn a worker for `sink` on the current tokio runtime.
    pub fn spawn(sink: Arc<dyn Sink>) -> Result<Self, SinkError> {
        let runtime = Handle::try_current().map_err(|_| SinkError::NoRuntime)?;
        let (tx, rx) = mpsc::unbounded_channel();
        runtime.spawn(run_worker(sink, rx));
        Ok(Self {
            tx,
            ids: RecordIdGenerator::new(),
        })
    }

    /// Queue a record body. Returns the assigned id, or `None` if the worker
    /// is gone.
    pub fn enqueue(&self, body: Fields) -> Option<String> {
        let id = self.ids.next_id();
        let record = Record {
            id: id.clone(),
            body,
        };
        match self.tx.send(Command::Persist(record)) {
            Ok(()) => Some(id),
            Err(_) => {
                tracing::error!(record_id = %id, "Sink worker stopped, record dropped");
                metrics::record_sink_failure();
                None
            }
        }
    }

    /// Wait until every record queued before this call has been handled.
    pub async fn flush(&self) {
        let (done_tx, done_rx) = oneshot::channel();
        if self.tx.send(Command::Flush(done_tx)).is_ok() {
            let _ = done_rx.await;
        }
    }
}

async fn run_worker(sink: Arc<dyn Sink>, mut rx: mpsc::UnboundedReceiver<Command>) {
    while let Some(command) = rx.recv().await {
        match command {
            Command::Persist(record) => {
                if let Err(e) = sink.persist(&record).await {
                    tracing::error!(record_id = %record.id, error = %e, "Failed to persist log record");
                    metrics::record_sink_failure();
                }
            }
            Command::Flush(done) => {
                let _ = done.send(());
            }
        }
    }
    tracing::debug!("Sink worker stopped");
}
