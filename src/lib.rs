//! Request-correlated structured logging.
//!
//! Events logged while a request is in flight are buffered under its
//! correlation id and written as one block when the request responds, times
//! out, or is abandoned. Events outside a request are written immediately.

pub mod config;
pub mod correlator;
pub mod crash;
pub mod event;
pub mod http;
pub mod lifecycle;
pub mod logger;
pub mod observability;
pub mod output;
pub mod sink;

pub use config::ChronicleConfig;
pub use correlator::{CorrelationId, Correlator, Outcome, RequestMeta};
pub use event::{Level, LogEvent, Payload};
pub use http::{ReportedError, RequestContext};
pub use logger::Logger;
pub use output::Dispatcher;
pub use sink::{Sink, SinkError};
