//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (request ID, tracing, timeout, limits, metrics)
//! - Accept connections until shutdown, drain, then abort stragglers

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{middleware, routing::get, Router};
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder;
use hyper_util::service::TowerToHyperService;
use metrics_exporter_prometheus::PrometheusHandle;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinSet;
use tower::ServiceBuilder;
use tower_http::{limit::RequestBodyLimitLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::{AppConfig, ApplicationConfig};
use crate::http::handlers;
use crate::http::limits::{limit_concurrency, ConcurrencyLimit};
use crate::http::request::{propagate_request_id_layer, request_span, set_request_id_layer};
use crate::lifecycle::Shutdown;
use crate::observability::metrics;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub identity: Arc<ApplicationConfig>,
    pub started_at: Instant,
    pub shutdown: Shutdown,
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(config: &AppConfig, shutdown: Shutdown, metrics: Option<PrometheusHandle>) -> Self {
        Self {
            identity: Arc::new(config.application.clone()),
            started_at: Instant::now(),
            shutdown,
            metrics,
        }
    }
}

/// Build the Axum router with all routes and middleware layers.
pub fn build_router(config: &AppConfig, state: AppState) -> Router {
    let mut router = Router::new()
        .route("/health", get(handlers::get_health))
        .route("/info", get(handlers::get_info));

    if state.metrics.is_some() {
        router = router.route("/metrics", get(handlers::get_metrics));
    }

    with_middleware(config, router.fallback(handlers::not_found).with_state(state))
}

/// Wrap every route already on `router` in the service middleware.
///
/// `Router::layer` calls listed first run innermost; inside the
/// `ServiceBuilder` the first layer is outermost.
#[allow(deprecated)]
pub fn with_middleware(config: &AppConfig, router: Router) -> Router {
    let limit = ConcurrencyLimit::new(config.server.max_concurrent_requests);

    router
        .layer(RequestBodyLimitLayer::new(config.server.max_body_bytes))
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(middleware::from_fn_with_state(limit, limit_concurrency))
        .layer(middleware::from_fn(metrics::track_requests))
        .layer(
            ServiceBuilder::new()
                .layer(set_request_id_layer())
                .layer(TraceLayer::new_for_http().make_span_with(request_span))
                .layer(propagate_request_id_layer()),
        )
}

/// HTTP server for the address web service.
pub struct HttpServer {
    router: Router,
    shutdown_grace: Duration,
}

impl HttpServer {
    pub fn new(router: Router, shutdown_grace: Duration) -> Self {
        Self {
            router,
            shutdown_grace,
        }
    }

    /// Serve on `listener` until `shutdown` fires.
    ///
    /// Then the listener is closed, open connections finish their current
    /// request and close, and whatever is still running when the grace period
    /// ends is aborted. Returns only once no connection task is left.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let (drain_tx, drain_rx) = watch::channel(false);
        let mut connections = JoinSet::new();

        loop {
            tokio::select! {
                // A closed channel means the coordinator is gone; stop as well.
                _ = shutdown.recv() => break,
                Some(_) = connections.join_next(), if !connections.is_empty() => {}
                accepted = listener.accept() => {
                    let (stream, peer) = match accepted {
                        Ok(conn) => conn,
                        Err(e) => {
                            tracing::error!(error = %e, "Failed to accept connection");
                            tokio::time::sleep(Duration::from_millis(100)).await;
                            continue;
                        }
                    };
                    connections.spawn(serve_connection(
                        stream,
                        peer,
                        self.router.clone(),
                        drain_rx.clone(),
                    ));
                }
            }
        }

        drop(listener);
        let _ = drain_tx.send(true);
        tracing::info!(open_connections = connections.len(), "Draining in-flight requests");

        let grace = self.shutdown_grace;
        let drained = tokio::time::timeout(grace, async {
            while connections.join_next().await.is_some() {}
        })
        .await;

        if drained.is_err() {
            tracing::warn!(
                grace_secs = grace.as_secs(),
                remaining = connections.len(),
                "Grace period elapsed, aborting remaining connections"
            );
            connections.shutdown().await;
        }

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Drive one connection; on drain, let the current request finish and close.
async fn serve_connection(
    stream: tokio::net::TcpStream,
    peer: std::net::SocketAddr,
    router: Router,
    mut drain: watch::Receiver<bool>,
) {
    let builder = Builder::new(TokioExecutor::new());
    let conn = builder.serve_connection_with_upgrades(
        TokioIo::new(stream),
        TowerToHyperService::new(router),
    );
    tokio::pin!(conn);

    let result = tokio::select! {
        result = conn.as_mut() => result,
        // Only ever flips to true, so any change (or a dropped sender) means drain.
        _ = drain.changed() => {
            conn.as_mut().graceful_shutdown();
            conn.await
        }
    };

    if let Err(e) = result {
        tracing::debug!(peer = %peer, error = %e, "Connection closed with error");
    }
}
