//! Process crash capture.
//!
//! Installs a panic hook that renders the first panic as a `process/crash`
//! event before handing over to the previously installed hook. The event
//! bypasses request buffering: a panicking handler may never complete.

use std::panic;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use crate::event::{Level, LogEvent};
use crate::output::Dispatcher;

/// Wrap the current panic hook with crash capture.
///
/// Only the first panic after installation is captured; the previous hook
/// always runs.
pub fn install(dispatcher: Dispatcher) {
    let previous = panic::take_hook();
    let captured = AtomicBool::new(false);

    panic::set_hook(Box::new(move |info| {
        if !captured.swap(true, Ordering::SeqCst) {
            let payload = info
                .payload()
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| info.payload().downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "Box<dyn Any>".to_string());
            let location = info
                .location()
                .map(|l| format!("{}:{}:{}", l.file(), l.line(), l.column()));

            dispatcher.dispatch_event(&crash_event(&payload, location.as_deref()));
        }
        previous(info);
    }));

    tracing::debug!("Crash hook installed");
}

fn crash_event(payload: &str, location: Option<&str>) -> LogEvent {
    let current = thread::current();
    let thread = current.name().unwrap_or("<unnamed>");
    let message = match location {
        Some(location) => format!("thread '{thread}' panicked at {location}:\n{payload}"),
        None => format!("thread '{thread}' panicked:\n{payload}"),
    };

    let event = LogEvent::new("process/crash", Level::Error).with_message(message);
    match location {
        Some(location) => event.with_source(location),
        None => event,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crash_event_shape() {
        let event = crash_event("boom", Some("src/jobs.rs:4:9"));
        assert_eq!(event.kind(), "process/crash");
        assert_eq!(event.level(), Level::Error);
        assert!(event.is_raw());
        assert!(event.message().unwrap().ends_with("panicked at src/jobs.rs:4:9:\nboom"));
        assert_eq!(event.source(), Some("src/jobs.rs:4:9"));
    }
}
