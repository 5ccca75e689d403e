//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection (server.rs accept loop, hyper-util)
//!     → request.rs (request ID, tracing span)
//!     → observability::metrics (timing)
//!     → limits.rs (in-flight bound), timeout, body limit
//!     → handlers.rs (/health, /info, /metrics, 404)
//! ```

pub mod handlers;
pub mod limits;
pub mod request;
pub mod server;

pub use request::X_REQUEST_ID;
pub use server::{build_router, with_middleware, AppState, HttpServer};
