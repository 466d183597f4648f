//! Observability subsystem.
//!
//! Diagnostics about chronicle itself, kept apart from the application
//! logs it renders.
//!
//! # Data Flow
//! ```text
//! correlator / sink / middleware
//!     → logging.rs (tracing events about chronicle's own behaviour)
//!     → metrics.rs (counters and gauges)
//!
//! Consumers:
//!     → stderr via tracing-subscriber
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Metric updates are no-ops until a recorder is installed
//! - Log level comes from RUST_LOG first, then config

pub mod logging;
pub mod metrics;
