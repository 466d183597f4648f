//! Startup orchestration.
//!
//! # Responsibilities
//! - Build the dispatcher from output config
//! - Connect the sink, if enabled, and redirect persistence to it
//! - Build the correlator on top of the dispatcher
//!
//! # Design Decisions
//! - Fail fast: a sink that cannot be opened is a startup error
//! - Async, so opening the sink never blocks a runtime worker

use std::sync::Arc;
use thiserror::Error;

use crate::config::ChronicleConfig;
use crate::correlator::Correlator;
use crate::output::{Dispatcher, LineWriter};
use crate::sink::{self, SinkError};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Failed to start persistence: {0}")]
    Sink(#[from] SinkError),
}

/// The wired-up logging core.
#[derive(Clone)]
pub struct Components {
    pub dispatcher: Dispatcher,
    pub correlator: Correlator,
}

/// Wire dispatcher, sink and correlator from `config`, writing to `writer`.
pub async fn build(
    config: &ChronicleConfig,
    writer: Arc<dyn LineWriter>,
) -> Result<Components, StartupError> {
    let dispatcher = Dispatcher::new(&config.output, writer);

    if let Some(sink) = sink::connect(&config.sink).await? {
        dispatcher.redirect(Some(sink))?;
    }

    let correlator = Correlator::new(dispatcher.clone(), &config.correlator);
    tracing::info!(
        timeout_secs = config.correlator.timeout_secs,
        persisting = dispatcher.is_persisting(),
        "Chronicle initialized"
    );

    Ok(Components {
        dispatcher,
        correlator,
    })
}
