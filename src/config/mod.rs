//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! defaults
//!     → address-ws.toml / --config / ADDRESS_WS_CONFIG (loader.rs)
//!     → ADDRESS_WS_<SECTION>__<FIELD> environment
//!     → --set key=value, --bind, --log-level
//!     → validation.rs (semantic checks)
//!     → AppConfig (validated, immutable)
//!     → shared via Arc to all subsystems
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{ConfigError, ConfigSources};
pub use schema::{AppConfig, ApplicationConfig, LogFormat, ObservabilityConfig, ServerConfig};
pub use validation::ValidationError;
