//! Address web service.
//!
//! Hosts the address web service: configuration discovery, component wiring,
//! HTTP listener setup, and graceful shutdown.
//!
//! # Architecture Overview
//!
//! ```text
//!   argv ──▶ cli ──▶ config (defaults ◀ file ◀ env ◀ flags)
//!                      │
//!                      ▼
//!              lifecycle::startup ──▶ observability (logging, metrics)
//!                      │
//!                      ▼
//!              AppContext (router + state) ──▶ net::listener ──▶ http::server
//!                      ▲
//!   SIGINT/SIGTERM ──▶ lifecycle::signals ──▶ Shutdown
//! ```

// Core subsystems
pub mod cli;
pub mod config;
pub mod error;
pub mod http;
pub mod net;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use config::AppConfig;
pub use error::StartupError;
pub use http::HttpServer;
pub use lifecycle::{AppContext, Application, Shutdown};
