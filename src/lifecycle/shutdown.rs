//! Shutdown coordination.

use tokio::sync::broadcast;

use crate::correlator::Correlator;

/// Coordinator for graceful shutdown.
///
/// Provides a broadcast channel that all long-running tasks can subscribe to.
#[derive(Clone)]
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    pub fn trigger(&self) {
        let _ = self.tx.send(());
    }

    /// Resolve once the signal has been triggered.
    pub async fn wait(&self) {
        let mut rx = self.subscribe();
        let _ = rx.recv().await;
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Flush everything still buffered: pending requests are drained as aborted
/// and the sink queue is awaited. Returns how many requests were drained.
pub async fn finish(correlator: &Correlator) -> usize {
    let drained = correlator.drain();
    correlator.dispatcher().flush_sink().await;
    tracing::info!(drained, "Chronicle shut down");
    drained
}
