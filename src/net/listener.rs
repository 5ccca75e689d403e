//! TCP listener setup.
//!
//! # Responsibilities
//! - Parse the configured bind address
//! - Bind the socket and report the actual local address

use std::net::SocketAddr;

use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::ServerConfig;

/// Error type for listener operations.
#[derive(Debug, Error)]
pub enum ListenerError {
    /// The configured address does not parse.
    #[error("invalid bind address `{address}`: {source}")]
    Address {
        address: String,
        #[source]
        source: std::net::AddrParseError,
    },
    /// Failed to bind to address.
    #[error("failed to bind {address}: {source}")]
    Bind {
        address: SocketAddr,
        #[source]
        source: std::io::Error,
    },
}

/// Parse the bind address from configuration.
pub fn bind_address(config: &ServerConfig) -> Result<SocketAddr, ListenerError> {
    config
        .bind_address
        .parse()
        .map_err(|source| ListenerError::Address {
            address: config.bind_address.clone(),
            source,
        })
}

/// Bind to the configured address.
///
/// Port `0` asks the OS for a free port; use `local_addr` on the result to
/// find out which.
pub async fn bind(config: &ServerConfig) -> Result<TcpListener, ListenerError> {
    let address = bind_address(config)?;

    let listener = TcpListener::bind(address)
        .await
        .map_err(|source| ListenerError::Bind { address, source })?;

    let local_addr = listener
        .local_addr()
        .map_err(|source| ListenerError::Bind { address, source })?;

    tracing::info!(
        address = %local_addr,
        max_concurrent_requests = config.max_concurrent_requests,
        "Listener bound"
    );

    Ok(listener)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server(bind_address: &str) -> ServerConfig {
        ServerConfig {
            bind_address: bind_address.to_string(),
            ..ServerConfig::default()
        }
    }

    #[tokio::test]
    async fn binds_ephemeral_port() {
        let listener = bind(&server("127.0.0.1:0")).await.unwrap();
        assert_ne!(listener.local_addr().unwrap().port(), 0);
    }

    #[tokio::test]
    async fn rejects_unparsable_address() {
        let err = bind(&server("nowhere")).await.unwrap_err();
        assert!(matches!(err, ListenerError::Address { .. }));
    }

    #[tokio::test]
    async fn reports_port_in_use() {
        let first = bind(&server("127.0.0.1:0")).await.unwrap();
        let taken = first.local_addr().unwrap().to_string();

        let err = bind(&server(&taken)).await.unwrap_err();
        assert!(matches!(err, ListenerError::Bind { .. }));
    }
}
