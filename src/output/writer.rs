//! Destinations for rendered text.

use std::io::Write;
use std::sync::{Arc, Mutex, PoisonError};

use crate::event::Level;

/// Receives fully rendered text. Implementations must not fail or block for
/// long; a block is always passed in a single call.
pub trait LineWriter: Send + Sync {
    fn write(&self, level: Level, text: &str);
}

/// Writes `log`/`info` to stdout and `warn`/`error` to stderr.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleWriter;

impl LineWriter for ConsoleWriter {
    fn write(&self, level: Level, text: &str) {
        // Write errors (closed pipe) are ignored; logging never fails the caller.
        if level.is_diagnostic() {
            let _ = writeln!(std::io::stderr().lock(), "{}", text);
        } else {
            let _ = writeln!(std::io::stdout().lock(), "{}", text);
        }
    }
}

/// Keeps everything written, for tests and embedding.
#[derive(Debug, Clone, Default)]
pub struct MemoryWriter {
    entries: Arc<Mutex<Vec<(Level, String)>>>,
}

impl MemoryWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all writes so far.
    pub fn entries(&self) -> Vec<(Level, String)> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Written texts without levels.
    pub fn texts(&self) -> Vec<String> {
        self.entries().into_iter().map(|(_, text)| text).collect()
    }

    pub fn clear(&self) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl LineWriter for MemoryWriter {
    fn write(&self, level: Level, text: &str) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((level, text.to_string()));
    }
}
