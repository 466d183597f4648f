//! Correlation identifier generation.

use chrono::{SecondsFormat, Utc};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Opaque token linking buffered events to one request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CorrelationId(String);

impl CorrelationId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for CorrelationId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Produces `{startup}-{counter}` identifiers.
///
/// The startup timestamp separates generators across process restarts; the
/// counter is never reused within one generator.
#[derive(Debug)]
pub struct IdGenerator {
    startup: String,
    counter: AtomicU64,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::with_startup(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    /// Generator with a fixed startup component.
    pub fn with_startup(startup: impl Into<String>) -> Self {
        Self {
            startup: startup.into(),
            counter: AtomicU64::new(0),
        }
    }

    pub fn next_id(&self) -> CorrelationId {
        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        CorrelationId(format!("{}-{}", self.startup, n))
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    #[test]
    fn test_ids_are_prefixed_and_sequential() {
        let ids = IdGenerator::with_startup("2026-01-01T00:00:00.000Z");
        assert_eq!(ids.next_id().as_str(), "2026-01-01T00:00:00.000Z-0");
        assert_eq!(ids.next_id().as_str(), "2026-01-01T00:00:00.000Z-1");
    }

    #[test]
    fn test_ids_unique_across_threads() {
        let ids = Arc::new(IdGenerator::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let ids = ids.clone();
                std::thread::spawn(move || (0..500).map(|_| ids.next_id()).collect::<Vec<_>>())
            })
            .collect();

        let mut seen = HashSet::new();
        for handle in handles {
            for id in handle.join().unwrap() {
                assert!(seen.insert(id), "duplicate correlation id");
            }
        }
        assert_eq!(seen.len(), 4000);
    }
}
