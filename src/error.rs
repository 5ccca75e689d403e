//! Top-level startup error.

use metrics_exporter_prometheus::BuildError;
use thiserror::Error;

use crate::config::ConfigError;
use crate::net::ListenerError;

/// Anything that stops the application from coming up or keeps it from
/// serving.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Listener(#[from] ListenerError),

    #[error("failed to install metrics recorder: {0}")]
    Metrics(#[from] BuildError),

    #[error("server error: {0}")]
    Serve(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, StartupError>;
