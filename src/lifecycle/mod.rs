//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     ChronicleConfig → Dispatcher → sink redirect → Correlator
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Shutdown::trigger
//!
//! Shutdown (shutdown.rs):
//!     Stop accepting → drain pending requests (Aborted) → flush sink → exit
//! ```
//!
//! # Design Decisions
//! - Buffered events are never discarded on a clean shutdown
//! - Sink failures at startup are fatal; at runtime they are only logged

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::{finish, Shutdown};
pub use startup::{build, Components, StartupError};
