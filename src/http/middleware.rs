//! Request tracking and error reporting middleware.
//!
//! # Responsibilities
//! - Register each request with the correlator and expose its context
//! - Complete the request exactly once: with the response status, or as
//!   aborted when the request future is dropped first
//! - Turn errors handlers reported into `server/error` events
//!
//! # Design Decisions
//! - Completion lives in a drop guard so cancellation cannot leak a pending entry
//! - Reported errors ride in response extensions, so handlers keep returning
//!   ordinary responses

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::error::Error as StdError;
use std::panic::Location;

use crate::config::ErrorConfig;
use crate::correlator::{CorrelationId, Correlator, Outcome, RequestMeta};
use crate::event::{payload::describe_error, Level, LogEvent};
use crate::http::RequestContext;

/// Correlate everything logged while serving a request.
///
/// Install with `axum::middleware::from_fn_with_state(correlator, track_requests)`.
pub async fn track_requests(
    State(correlator): State<Correlator>,
    mut req: Request,
    next: Next,
) -> Response {
    let id = correlator.begin_request(request_meta(&req));
    req.extensions_mut().insert(RequestContext::new(id.clone()));

    let completion = Completion {
        correlator,
        id: Some(id),
    };
    let response = next.run(req).await;
    completion.respond(response.status());
    response
}

fn request_meta(req: &Request) -> RequestMeta {
    let meta = RequestMeta::new(req.method().as_str(), req.uri().to_string())
        .with_http_version(format!("{:?}", req.version()));

    req.headers().iter().fold(meta, |meta, (name, value)| {
        meta.with_header(name.as_str(), String::from_utf8_lossy(value.as_bytes()))
    })
}

/// Completes a tracked request once, on response or on drop.
struct Completion {
    correlator: Correlator,
    id: Option<CorrelationId>,
}

impl Completion {
    fn respond(mut self, status: StatusCode) {
        if let Some(id) = self.id.take() {
            self.correlator
                .complete_request(&id, Outcome::responded(status.as_u16()));
        }
    }
}

impl Drop for Completion {
    fn drop(&mut self) {
        if let Some(id) = self.id.take() {
            tracing::debug!(correlation_id = %id, "Request dropped before a response");
            self.correlator.complete_request(&id, Outcome::aborted());
        }
    }
}

/// State for [`report_errors`].
#[derive(Clone)]
pub struct ErrorReporting {
    pub correlator: Correlator,
    /// Replace the response with a bare 500 instead of passing it on.
    pub terminal: bool,
}

impl ErrorReporting {
    pub fn new(correlator: Correlator, config: &ErrorConfig) -> Self {
        Self {
            correlator,
            terminal: config.terminal,
        }
    }
}

/// Log errors attached to responses via [`ReportedError`].
///
/// Must run inside [`track_requests`] for the event to join the request's block.
pub async fn report_errors(
    State(reporting): State<ErrorReporting>,
    req: Request,
    next: Next,
) -> Response {
    let context = req.extensions().get::<RequestContext>().cloned();
    let mut response = next.run(req).await;

    let Some(reported) = response.extensions_mut().remove::<ReportedError>() else {
        return response;
    };

    let event = LogEvent::new("server/error", Level::Error)
        .with_message(reported.message)
        .with_source(reported.source);
    reporting
        .correlator
        .log(context.as_ref().map(RequestContext::id), event);

    if reporting.terminal {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }
    response
}

/// An error a handler wants logged with its request.
///
/// Converting it into a response attaches it as an extension, where
/// [`report_errors`] picks it up.
#[derive(Debug, Clone)]
pub struct ReportedError {
    message: String,
    source: String,
}

impl ReportedError {
    /// Capture `err` and its cause chain at the caller's location.
    #[track_caller]
    pub fn new(err: &(dyn StdError + 'static)) -> Self {
        let caller = Location::caller();
        Self {
            message: describe_error(err),
            source: format!("{}:{}", caller.file(), caller.line()),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn source_location(&self) -> &str {
        &self.source
    }

    /// Respond with `status` and the error's top-level message as body.
    pub fn into_response_with(self, status: StatusCode) -> Response {
        let body = self.message.lines().next().unwrap_or_default().to_string();
        let mut response = (status, body).into_response();
        response.extensions_mut().insert(self);
        response
    }

    /// Shorthand for a reported 500.
    #[track_caller]
    pub fn respond(err: &(dyn StdError + 'static)) -> Response {
        Self::new(err).into_response()
    }
}

impl IntoResponse for ReportedError {
    fn into_response(self) -> Response {
        self.into_response_with(StatusCode::INTERNAL_SERVER_ERROR)
    }
}
