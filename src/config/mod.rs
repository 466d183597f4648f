//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ChronicleConfig (validated, immutable)
//!     → sections handed to correlator, output, sink, observability
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    ChronicleConfig, CorrelatorConfig, ErrorConfig, ObservabilityConfig, OutputConfig,
    ServerConfig, SinkConfig,
};
