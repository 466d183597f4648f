//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0)
//! - Check addresses parse and the sink has somewhere to write
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Validation is a pure function: ChronicleConfig → Result<(), Vec<ValidationError>>

use std::net::SocketAddr;
use thiserror::Error;

use crate::config::schema::ChronicleConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("correlator.timeout_secs must be greater than 0")]
    ZeroCorrelatorTimeout,

    #[error("server.request_timeout_secs must be greater than 0")]
    ZeroRequestTimeout,

    #[error("invalid {field} address '{value}'")]
    InvalidAddress { field: &'static str, value: String },

    #[error("sink.path is required when sink.enabled is true")]
    MissingSinkPath,

    #[error("sink.collection must not be empty or contain path separators")]
    InvalidCollection,
}

/// Check a configuration, collecting every problem.
pub fn validate_config(config: &ChronicleConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.correlator.timeout_secs == 0 {
        errors.push(ValidationError::ZeroCorrelatorTimeout);
    }

    if config.server.request_timeout_secs == 0 {
        errors.push(ValidationError::ZeroRequestTimeout);
    }

    if config.server.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "server.bind_address",
            value: config.server.bind_address.clone(),
        });
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    if config.sink.enabled && config.sink.path.is_none() {
        errors.push(ValidationError::MissingSinkPath);
    }

    if let Some(collection) = &config.sink.collection {
        if collection.is_empty() || collection.contains(['/', '\\']) {
            errors.push(ValidationError::InvalidCollection);
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
