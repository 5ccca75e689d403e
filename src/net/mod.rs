//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! ServerConfig.bind_address
//!     → listener.rs (parse, bind)
//!     → Hand off to HTTP layer (HttpServer accept loop)
//! ```

pub mod listener;

pub use listener::ListenerError;
