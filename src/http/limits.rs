//! In-flight request limit.
//!
//! A semaphore bounds how many requests are processed at once. Excess
//! requests wait for a slot rather than being rejected.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tokio::sync::Semaphore;

/// Shared permit pool.
#[derive(Clone, Debug)]
pub struct ConcurrencyLimit {
    permits: Arc<Semaphore>,
    max: usize,
}

impl ConcurrencyLimit {
    pub fn new(max: usize) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(max)),
            max,
        }
    }

    /// Slots currently free.
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }

    /// Configured maximum.
    pub fn max(&self) -> usize {
        self.max
    }
}

/// Middleware holding a permit for the duration of the request.
pub async fn limit_concurrency(
    State(limit): State<ConcurrencyLimit>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if limit.available() == 0 {
        tracing::debug!(max = limit.max(), "Concurrency limit reached, request queued");
    }

    match limit.permits.acquire().await {
        Ok(_permit) => next.run(request).await,
        // Only happens if the semaphore is closed.
        Err(_) => StatusCode::SERVICE_UNAVAILABLE.into_response(),
    }
}
