//! Demo HTTP server wiring.
//!
//! # Routes
//! - `/` logs a handful of known kinds and responds
//! - `/whoa` fails and reports the error with its request
//! - `/timeout` never answers, so the correlator times it out first
//!
//! # Layers (outermost first)
//! ```text
//! TraceLayer → track_requests → report_errors → TimeoutLayer → handler
//! ```

use axum::{extract::State, middleware::from_fn_with_state, routing::get, Router};
use serde_json::json;
use std::fmt;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::ChronicleConfig;
use crate::correlator::Correlator;
use crate::http::{report_errors, track_requests, ErrorReporting, ReportedError, RequestContext};
use crate::logger::Logger;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub correlator: Correlator,
    pub logger: Logger,
}

impl AppState {
    pub fn new(correlator: Correlator) -> Self {
        Self {
            logger: Logger::new(correlator.clone()),
            correlator,
        }
    }
}

/// Build the demo router with both middlewares installed.
#[allow(deprecated)]
pub fn demo_router(state: AppState, config: &ChronicleConfig) -> Router {
    let reporting = ErrorReporting::new(state.correlator.clone(), &config.errors);
    let correlator = state.correlator.clone();

    Router::new()
        .route("/", get(index))
        .route("/whoa", get(whoa))
        .route("/timeout", get(hang))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(from_fn_with_state(correlator, track_requests))
                .layer(from_fn_with_state(reporting, report_errors))
                .layer(TimeoutLayer::new(Duration::from_secs(
                    config.server.request_timeout_secs,
                ))),
        )
}

async fn index(State(state): State<AppState>, ctx: RequestContext) -> &'static str {
    let log = state.logger.bind(&ctx);

    log.time().info(
        "db/call",
        json!({"name": "findUser", "args": [{"email": "ada@example.com"}]}),
    );
    log.info(
        "db/update",
        json!({
            "statement": "UPDATE users SET last_seen = ? WHERE id = ?",
            "values": ["2024-01-01T00:00:00Z", 42]
        }),
    );
    log.info("cache/get", json!({"partition": "users", "row": 42}));
    log.log(
        "email/sent",
        json!({"subject": "Welcome back", "to": "ada@example.com"}),
    );
    log.info("note", "Rendered with the generic renderer");

    "Hello, world!"
}

#[derive(Debug)]
struct Whoa;

impl fmt::Display for Whoa {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Whoa, something broke")
    }
}

impl std::error::Error for Whoa {}

async fn whoa(State(state): State<AppState>, ctx: RequestContext) -> ReportedError {
    state.logger.bind(&ctx).warn("note", "About to fail");
    ReportedError::new(&Whoa)
}

async fn hang() {
    std::future::pending::<()>().await
}
