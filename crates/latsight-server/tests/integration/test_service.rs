//! End-to-end tests for the health check, metrics and routing

use latsight_core::config::ConfigBuilder;
use reqwest::StatusCode;
use serde_json::{json, Value};

use crate::common::{start_default_server, start_server};

#[tokio::test]
async fn test_health_check() {
    let server = start_default_server().await;

    let response = reqwest::get(server.url("/")).await.expect("send request");
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.expect("json body");
    assert_eq!(body, json!({ "status": "ok" }));

    server.stop().await;
}

#[tokio::test]
async fn test_unknown_path_is_404() {
    let server = start_default_server().await;

    let response = reqwest::get(server.url("/does-not-exist"))
        .await
        .expect("send request");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    server.stop().await;
}

#[tokio::test]
async fn test_wrong_method_is_405() {
    let server = start_default_server().await;

    let response = reqwest::get(server.url("/analytics"))
        .await
        .expect("send request");
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(response.headers()["allow"], "POST, OPTIONS");

    server.stop().await;
}

#[tokio::test]
async fn test_metrics_exposition() {
    let server = start_default_server().await;
    let client = reqwest::Client::new();

    client
        .post(server.url("/analytics"))
        .json(&json!({ "regions": ["apac"], "threshold_ms": 150 }))
        .send()
        .await
        .expect("send request");

    let response = client
        .get(server.url("/metrics"))
        .send()
        .await
        .expect("scrape metrics");
    assert_eq!(response.status(), StatusCode::OK);
    let text = response.text().await.expect("metrics text");
    assert!(text.contains("latsight_http_requests_total"));
    assert!(text.contains("latsight_aggregation_duration_seconds"));

    server.stop().await;
}

#[tokio::test]
async fn test_metrics_disabled() {
    let config = ConfigBuilder::new().metrics_enabled(false).build();
    let server = start_server(config).await;

    let response = reqwest::get(server.url("/metrics"))
        .await
        .expect("send request");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    server.stop().await;
}

#[tokio::test]
async fn test_body_limit_enforced() {
    let config = ConfigBuilder::new().max_body_bytes(64).build();
    let server = start_server(config).await;

    let regions = vec!["apac"; 50];
    let response = reqwest::Client::new()
        .post(server.url("/analytics"))
        .json(&json!({ "regions": regions, "threshold_ms": 1 }))
        .send()
        .await
        .expect("send request");
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);

    server.stop().await;
}

#[tokio::test]
async fn test_cors_disabled() {
    let config = ConfigBuilder::new().cors_enabled(false).build();
    let server = start_server(config).await;

    let response = reqwest::Client::new()
        .post(server.url("/analytics"))
        .json(&json!({ "regions": ["apac"], "threshold_ms": 150 }))
        .send()
        .await
        .expect("send request");
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get("access-control-allow-origin").is_none());

    server.stop().await;
}
