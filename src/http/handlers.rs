//! Operational endpoints: health, info, metrics and the 404 fallback.

use axum::{
    extract::State,
    http::{header, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::http::server::AppState;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthStatus {
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServiceInfo {
    pub name: String,
    pub version: String,
    pub environment: String,
    pub uptime_secs: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub path: String,
}

/// `UP` while serving, `DOWN` with 503 once shutdown has started so load
/// balancers stop routing here during the drain.
pub async fn get_health(State(state): State<AppState>) -> (StatusCode, Json<HealthStatus>) {
    if state.shutdown.is_triggered() {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(HealthStatus {
                status: "DOWN".to_string(),
            }),
        )
    } else {
        (
            StatusCode::OK,
            Json(HealthStatus {
                status: "UP".to_string(),
            }),
        )
    }
}

pub async fn get_info(State(state): State<AppState>) -> Json<ServiceInfo> {
    Json(ServiceInfo {
        name: state.identity.name.clone(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        environment: state.identity.environment.clone(),
        uptime_secs: state.started_at.elapsed().as_secs(),
    })
}

pub async fn get_metrics(State(state): State<AppState>) -> Response {
    match &state.metrics {
        Some(handle) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            handle.render(),
        )
            .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

pub async fn not_found(uri: Uri) -> (StatusCode, Json<ErrorBody>) {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorBody {
            error: "not found".to_string(),
            path: uri.path().to_string(),
        }),
    )
}
