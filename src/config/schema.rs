//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files, and
//! every section has defaults so an empty file is a valid configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ChronicleConfig {
    /// Demo server listener.
    pub server: ServerConfig,

    /// Request correlation settings.
    pub correlator: CorrelatorConfig,

    /// Console rendering settings.
    pub output: OutputConfig,

    /// Optional persistence of finished records.
    pub sink: SinkConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Error middleware behaviour.
    pub errors: ErrorConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "127.0.0.1:3000").
    pub bind_address: String,

    /// Hard request timeout enforced by the server in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:3000".to_string(),
            request_timeout_secs: 120,
        }
    }
}

/// Correlator configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CorrelatorConfig {
    /// Seconds a request may stay pending before it is flushed as timed out.
    pub timeout_secs: u64,
}

impl Default for CorrelatorConfig {
    fn default() -> Self {
        Self { timeout_secs: 60 }
    }
}

/// Console output configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Colorize kinds, status codes and durations.
    pub color: bool,

    /// Base path stripped from source locations before persistence.
    pub root_path: Option<PathBuf>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            color: true,
            root_path: None,
        }
    }
}

/// Persistence sink configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct SinkConfig {
    /// Persist finished records.
    pub enabled: bool,

    /// Directory holding the record files.
    pub path: Option<PathBuf>,

    /// Collection (file stem) inside `path`.
    pub collection: Option<String>,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level for chronicle's own diagnostics (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

/// Error middleware configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ErrorConfig {
    /// Replace reported errors with a bare 500 instead of passing them on.
    pub terminal: bool,
}
