//! Event model subsystem.
//!
//! # Data Flow
//! ```text
//! Logger call (kind, payload)
//!     → payload.rs (string / error chain / structured fields)
//!     → capture.rs (owned, depth-guarded copy of caller data)
//!     → model.rs (immutable LogEvent)
//!     → correlator (buffered) or output (standalone)
//! ```
//!
//! # Design Decisions
//! - Events are immutable once built; builders consume `self`
//! - Fields keep insertion order (serde_json `preserve_order`)
//! - Caller data is copied, never borrowed past the log call

pub mod capture;
pub mod model;
pub mod payload;

pub use model::{Level, LogEvent};
pub use payload::Payload;

/// Ordered field mapping carried by every event.
pub type Fields = serde_json::Map<String, serde_json::Value>;
