//! End-to-end tests against a bound application.

use std::time::Duration;

use address_ws::config::AppConfig;
use address_ws::http::X_REQUEST_ID;
use address_ws::{AppContext, Application};
use serde_json::Value;

mod common;

#[tokio::test]
async fn serves_health_and_info() {
    let app = common::spawn_app(common::local_config()).await;
    let client = common::client();

    let res = client.get(app.url("/health")).send().await.expect("app unreachable");
    assert_eq!(res.status(), 200);
    assert!(res.headers().contains_key(X_REQUEST_ID));
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["status"], "UP");

    let res = client.get(app.url("/info")).send().await.unwrap();
    assert_eq!(res.status(), 200);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["name"], "address-ws");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));

    assert!(app.stop().await.is_ok());
}

#[tokio::test]
async fn unknown_routes_are_404() {
    let app = common::spawn_app(common::local_config()).await;

    let res = common::client()
        .get(app.url("/nothing/here"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 404);

    app.stop().await.unwrap();
}

#[tokio::test]
async fn oversized_body_is_rejected() {
    let mut config = common::local_config();
    config.server.max_body_bytes = 16;
    let app = common::spawn_app(config).await;

    let res = common::client()
        .post(app.url("/health"))
        .body(vec![b'x'; 1024])
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 413);

    app.stop().await.unwrap();
}

#[tokio::test]
async fn stops_accepting_after_shutdown() {
    let app = common::spawn_app(common::local_config()).await;
    let url = app.url("/health");

    app.stop().await.unwrap();

    let res = common::client()
        .get(url)
        .timeout(Duration::from_secs(2))
        .send()
        .await;
    assert!(res.is_err(), "listener should be closed after shutdown");
}

#[tokio::test]
async fn shutdown_before_serving_returns_immediately() {
    let context = AppContext::build(common::local_config()).unwrap();
    let app = Application::bind(context).await.unwrap();
    app.shutdown_handle().trigger();

    let result = tokio::time::timeout(Duration::from_secs(2), app.serve())
        .await
        .expect("serve should not block");
    assert!(result.is_ok());
}

#[tokio::test]
async fn bind_failure_is_reported() {
    let first = common::spawn_app(common::local_config()).await;

    let mut config = AppConfig::default();
    config.server.bind_address = first.addr.to_string();
    let context = AppContext::build(config).unwrap();

    assert!(matches!(
        Application::bind(context).await,
        Err(address_ws::StartupError::Listener(_))
    ));

    first.stop().await.unwrap();
}
