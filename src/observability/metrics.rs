//! Metrics collection and exposition.
//!
//! # Metrics
//! - `chronicle_requests_begun_total` (counter): requests registered with the correlator
//! - `chronicle_blocks_flushed_total` (counter): flushed blocks by outcome
//! - `chronicle_standalone_events_total` (counter): events logged outside a request
//! - `chronicle_pending_requests` (gauge): requests currently buffering
//! - `chronicle_sink_failures_total` (counter): records the sink failed to persist
//!
//! # Design Decisions
//! - Recording functions wrap the `metrics` macros so names live in one place
//! - Without `init_metrics` every call is a cheap no-op

use metrics::{counter, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Install the Prometheus recorder and serve it on `addr`.
///
/// Must be called from within a tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint started"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to start metrics endpoint"),
    }
}

pub fn record_request_begun() {
    counter!("chronicle_requests_begun_total").increment(1);
}

/// Record a flushed block; `outcome` is "responded", "timeout" or "aborted".
pub fn record_block_flushed(outcome: &'static str) {
    counter!("chronicle_blocks_flushed_total", "outcome" => outcome).increment(1);
}

pub fn record_standalone_event() {
    counter!("chronicle_standalone_events_total").increment(1);
}

pub fn record_pending(count: usize) {
    gauge!("chronicle_pending_requests").set(count as f64);
}

pub fn record_sink_failure() {
    counter!("chronicle_sink_failures_total").increment(1);
}
