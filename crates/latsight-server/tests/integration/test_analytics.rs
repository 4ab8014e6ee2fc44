//! End-to-end tests for `POST /analytics`

use reqwest::StatusCode;
use serde_json::{json, Value};

use crate::common::start_default_server;

async fn post_analytics(client: &reqwest::Client, url: &str, body: &str) -> reqwest::Response {
    client
        .post(url)
        .header("content-type", "application/json")
        .body(body.to_string())
        .send()
        .await
        .expect("send request")
}

#[tokio::test]
async fn test_apac_threshold_150() {
    let server = start_default_server().await;
    let client = reqwest::Client::new();

    let response = client
        .post(server.url("/analytics"))
        .json(&json!({ "regions": ["apac"], "threshold_ms": 150 }))
        .send()
        .await
        .expect("send request");

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.expect("json body");
    assert_eq!(
        body,
        json!([{
            "region": "apac",
            "avg_latency": 172.68,
            "p95_latency": 218.76,
            "avg_uptime": 98.18,
            "breaches": 8
        }])
    );

    server.stop().await;
}

#[tokio::test]
async fn test_all_regions_threshold_zero() {
    let server = start_default_server().await;
    let client = reqwest::Client::new();

    let response = post_analytics(
        &client,
        &server.url("/analytics"),
        r#"{"regions":["apac","emea","amer"],"threshold_ms":0}"#,
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body: Vec<Value> = response.json().await.expect("json body");
    let regions: Vec<&str> = body.iter().map(|m| m["region"].as_str().unwrap()).collect();
    assert_eq!(regions, vec!["amer", "apac", "emea"]);
    for m in &body {
        assert_eq!(m["breaches"], 12);
    }

    server.stop().await;
}

#[tokio::test]
async fn test_unknown_and_empty_regions_return_empty_array() {
    let server = start_default_server().await;
    let client = reqwest::Client::new();
    let url = server.url("/analytics");

    for body in [
        r#"{"regions":["unknown_region"],"threshold_ms":100}"#,
        r#"{"regions":[],"threshold_ms":100}"#,
    ] {
        let response = post_analytics(&client, &url, body).await;
        assert_eq!(response.status(), StatusCode::OK);
        let value: Value = response.json().await.expect("json body");
        assert_eq!(value, json!([]), "body {body}");
    }

    server.stop().await;
}

#[tokio::test]
async fn test_whole_number_thresholds_are_accepted() {
    let server = start_default_server().await;
    let client = reqwest::Client::new();
    let url = server.url("/analytics");

    for (body, breaches) in [
        (r#"{"regions":["apac"],"threshold_ms":150.0}"#, 8),
        (r#"{"regions":["apac"],"threshold_ms":"150"}"#, 8),
        (r#"{"regions":["apac"],"threshold_ms":100000000000000000000}"#, 0),
    ] {
        let response = post_analytics(&client, &url, body).await;
        assert_eq!(response.status(), StatusCode::OK, "body {body:?}");
        let value: Value = response.json().await.expect("json body");
        assert_eq!(value[0]["breaches"], breaches, "body {body:?}");
    }

    server.stop().await;
}

#[tokio::test]
async fn test_malformed_bodies_are_rejected() {
    let server = start_default_server().await;
    let client = reqwest::Client::new();
    let url = server.url("/analytics");

    for body in [
        r#"{"regions":["apac"]}"#,
        r#"{"threshold_ms":150}"#,
        r#"{"regions":"apac","threshold_ms":150}"#,
        r#"{"regions":["apac"],"threshold_ms":"1.5"}"#,
        r#"{"regions":["apac"],"threshold_ms":1.5}"#,
        r#"{"regions":["apac"],"threshold_ms":true}"#,
        r#"{"regions":["apac"],"#,
        "",
    ] {
        let response = post_analytics(&client, &url, body).await;
        assert_eq!(
            response.status(),
            StatusCode::UNPROCESSABLE_ENTITY,
            "body {body:?}"
        );
        let value: Value = response.json().await.expect("json error body");
        assert!(value["detail"].is_string(), "body {body:?}");
    }

    server.stop().await;
}

#[tokio::test]
async fn test_cors_headers_on_post_and_preflight() {
    let server = start_default_server().await;
    let client = reqwest::Client::new();
    let url = server.url("/analytics");

    let response = client
        .post(&url)
        .header("origin", "https://dashboard.example.com")
        .json(&json!({ "regions": ["emea"], "threshold_ms": 200 }))
        .send()
        .await
        .expect("send request");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["access-control-allow-origin"], "*");

    let preflight = client
        .request(reqwest::Method::OPTIONS, &url)
        .header("origin", "https://dashboard.example.com")
        .header("access-control-request-method", "POST")
        .header("access-control-request-headers", "content-type")
        .send()
        .await
        .expect("send preflight");
    assert_eq!(preflight.status(), StatusCode::OK);
    assert_eq!(preflight.headers()["access-control-allow-origin"], "*");
    assert_eq!(
        preflight.headers()["access-control-allow-methods"],
        "POST, OPTIONS"
    );
    assert_eq!(
        preflight.headers()["access-control-allow-headers"],
        "content-type"
    );

    server.stop().await;
}

#[tokio::test]
async fn test_concurrent_requests_agree() {
    let server = start_default_server().await;
    let client = reqwest::Client::new();
    let url = server.url("/analytics");

    let mut handles = Vec::new();
    for _ in 0..16 {
        let client = client.clone();
        let url = url.clone();
        handles.push(tokio::spawn(async move {
            let response = client
                .post(&url)
                .json(&json!({ "regions": ["amer", "emea"], "threshold_ms": 150 }))
                .send()
                .await
                .expect("send request");
            response.json::<Value>().await.expect("json body")
        }));
    }

    let mut bodies = Vec::new();
    for handle in handles {
        bodies.push(handle.await.expect("request task"));
    }
    assert!(bodies.windows(2).all(|w| w[0] == w[1]));
    assert_eq!(bodies[0][0]["region"], "amer");
    assert_eq!(bodies[0][0]["breaches"], 4);
    assert_eq!(bodies[0][1]["breaches"], 10);

    server.stop().await;
}
