//! HTTP integration subsystem.
//!
//! # Data Flow
//! ```text
//! request
//!     → track_requests (begin_request, RequestContext into extensions)
//!     → report_errors
//!     → handler (Logger::bind(&ctx) buffers events)
//!     ← report_errors (ReportedError → server/error event, re-raise or 500)
//!     ← track_requests (complete_request with status, or Aborted on drop)
//! response
//! ```
//!
//! # Design Decisions
//! - Middleware are plain `from_fn_with_state` functions, no custom Service types
//! - The correlation id travels in request extensions, never in headers

pub mod context;
pub mod middleware;
pub mod server;

pub use context::RequestContext;
pub use middleware::{report_errors, track_requests, ErrorReporting, ReportedError};
pub use server::{demo_router, AppState};
