//! Output dispatch subsystem.
//!
//! # Data Flow
//! ```text
//! FinishedBlock / standalone LogEvent
//!     → render.rs (summary line, per-kind formats, generic fallback)
//!     → writer.rs (console: stdout/stderr by level, or memory)
//!     → sink (optional): flattened record queued for persistence
//! ```
//!
//! # Design Decisions
//! - A block is written in one call so concurrent requests never interleave
//! - The sink and the root path can be swapped at runtime without locks
//! - Nothing here returns an error to the caller

pub mod inspect;
pub mod palette;
pub mod render;
pub mod writer;

pub use palette::Palette;
pub use render::Renderer;
pub use writer::{ConsoleWriter, LineWriter, MemoryWriter};

use arc_swap::ArcSwapOption;
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::OutputConfig;
use crate::correlator::FinishedBlock;
use crate::event::LogEvent;
use crate::sink::{record, Sink, SinkError, SinkHandle};

/// Renders blocks and events, writes them, and forwards them to the sink.
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<DispatcherInner>,
}

struct DispatcherInner {
    renderer: Renderer,
    writer: Arc<dyn LineWriter>,
    sink: ArcSwapOption<SinkHandle>,
    root_path: ArcSwapOption<PathBuf>,
}

impl Dispatcher {
    pub fn new(config: &OutputConfig, writer: Arc<dyn LineWriter>) -> Self {
        Self {
            inner: Arc::new(DispatcherInner {
                renderer: Renderer::new(Palette::new(config.color)),
                writer,
                sink: ArcSwapOption::empty(),
                root_path: ArcSwapOption::new(config.root_path.clone().map(Arc::new)),
            }),
        }
    }

    /// Dispatcher writing to stdout/stderr.
    pub fn console(config: &OutputConfig) -> Self {
        Self::new(config, Arc::new(ConsoleWriter))
    }

    /// Render and write a flushed request, then queue its record.
    pub fn dispatch_block(&self, block: &FinishedBlock) {
        let text = self.inner.renderer.render_block(block);
        self.inner.writer.write(block.level(), &text);

        if let Some(sink) = self.inner.sink.load_full() {
            let root = self.inner.root_path.load_full();
            sink.enqueue(record::block_body(block, root.as_deref().map(|p| p.as_path())));
        }
    }

    /// Render and write a standalone event, then queue its record.
    pub fn dispatch_event(&self, event: &LogEvent) {
        let text = self.inner.renderer.render_event(event);
        self.inner.writer.write(event.level(), &text);

        if let Some(sink) = self.inner.sink.load_full() {
            let root = self.inner.root_path.load_full();
            sink.enqueue(record::event_body(event, root.as_deref().map(|p| p.as_path())));
        }
    }

    /// Send records to `sink` from now on; `None` returns to console-only.
    ///
    /// The previous sink, if any, finishes what it has queued in the
    /// background.
    pub fn redirect(&self, sink: Option<Arc<dyn Sink>>) -> Result<(), SinkError> {
        let handle = sink.map(SinkHandle::spawn).transpose()?;
        let enabled = handle.is_some();
        self.inner.sink.store(handle.map(Arc::new));
        tracing::info!(enabled, "Persistence redirected");
        Ok(())
    }

    /// Whether records are currently being persisted.
    pub fn is_persisting(&self) -> bool {
        self.inner.sink.load().is_some()
    }

    /// Wait until queued records reach the current sink.
    pub async fn flush_sink(&self) {
        if let Some(sink) = self.inner.sink.load_full() {
            sink.flush().await;
        }
    }

    /// Base path stripped from source locations before persistence.
    pub fn set_root_path(&self, root: Option<PathBuf>) {
        self.inner.root_path.store(root.map(Arc::new));
    }

    pub fn root_path(&self) -> Option<PathBuf> {
        self.inner.root_path.load_full().map(|root| root.as_ref().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::correlator::{CorrelationId, Outcome, RequestMeta};
    use crate::event::Level;
    use crate::sink::MemorySink;
    use serde_json::json;

    fn plain() -> OutputConfig {
        OutputConfig {
            color: false,
            ..OutputConfig::default()
        }
    }

    #[test]
    fn test_levels_follow_outcome() {
        let writer = MemoryWriter::new();
        let dispatcher = Dispatcher::new(&plain(), Arc::new(writer.clone()));
        let meta = RequestMeta::new("GET", "/slow");
        let block = FinishedBlock {
            id: CorrelationId::from("x-1".to_string()),
            outcome: Outcome::TimedOut { at: meta.arrived_at },
            meta,
            events: Vec::new(),
        };

        dispatcher.dispatch_block(&block);
        dispatcher.dispatch_event(&LogEvent::new("note", Level::Error).with_message("bad"));

        let entries = writer.entries();
        assert_eq!(entries[0].0, Level::Warn);
        assert_eq!(entries[1], (Level::Error, "note\n  bad".to_string()));
    }

    #[tokio::test]
    async fn test_redirect_and_root_path() {
        let writer = MemoryWriter::new();
        let dispatcher = Dispatcher::new(&plain(), Arc::new(writer.clone()));
        let sink = MemorySink::new();

        dispatcher.redirect(Some(Arc::new(sink.clone()))).unwrap();
        dispatcher.set_root_path(Some(PathBuf::from("/srv/app")));
        assert!(dispatcher.is_persisting());

        dispatcher.dispatch_event(
            &LogEvent::new("note", Level::Info)
                .with_message("kept")
                .with_source("/srv/app/src/jobs.rs:3"),
        );
        dispatcher.flush_sink().await;

        let records = sink.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].body["source"], json!("src/jobs.rs:3"));

        dispatcher.redirect(None).unwrap();
        assert!(!dispatcher.is_persisting());
        dispatcher.dispatch_event(&LogEvent::new("note", Level::Info).with_message("console only"));
        assert_eq!(sink.records().len(), 1);
        assert_eq!(writer.entries().len(), 2);
    }
}
