//! Integration tests for the relay HTTP surface: registration validation,
//! webhook intake status codes, and flush-on-register.

mod common;

use common::{http_probe_state, spawn_relay, stub_probe_state};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mock_client_service() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ping"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"isUp": true})))
        .mount(&server)
        .await;
    server
}

#[tokio::test]
async fn test_index_route_is_up() {
    let addr = spawn_relay(stub_probe_state(true)).await;
    let response = reqwest::get(format!("http://{addr}/")).await.unwrap();
    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body, json!({"message": "Hello, World"}));
}

#[tokio::test]
async fn test_init_accepts_numeric_and_string_ports() {
    let addr = spawn_relay(stub_probe_state(true)).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("http://{addr}/demo/init"))
        .json(&json!({"port": 9005}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let response = client
        .post(format!("http://{addr}/demo/init"))
        .json(&json!({"port": "9005"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn test_init_rejects_bad_bodies() {
    let addr = spawn_relay(stub_probe_state(true)).await;
    let client = reqwest::Client::new();
    let url = format!("http://{addr}/demo/init");

    for body in [
        "",
        "not json",
        r#"[{"port": 9005}]"#,
        r#"{"noport": true}"#,
        r#"{"port": "abc"}"#,
        r#"{"port": 1999}"#,
    ] {
        let response = client
            .post(&url)
            .header("content-type", "application/json")
            .body(body.to_string())
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 400, "body {body:?} should be rejected");
        let error: serde_json::Value = response.json().await.unwrap();
        assert_eq!(error["error"], "bad_request");
    }
}

#[tokio::test]
async fn test_init_rejects_service_that_fails_the_probe() {
    let addr = spawn_relay(stub_probe_state(false)).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("http://{addr}/demo/init"))
        .json(&json!({"port": 9005}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);

    // Nothing was registered: a webhook for the service is queued.
    let response = client
        .post(format!("http://{addr}/demo"))
        .json(&json!({"a": 1}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 202);
}

#[tokio::test]
async fn test_init_probes_the_claimed_port() {
    let downstream = mock_client_service().await;
    let addr = spawn_relay(http_probe_state()).await;

    let response = reqwest::Client::new()
        .post(format!("http://{addr}/demo/init"))
        .json(&json!({"port": downstream.address().port()}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let pings = downstream
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|request| request.url.path() == "/ping")
        .count();
    assert_eq!(pings, 1);
}

#[tokio::test]
async fn test_webhook_for_unregistered_service_is_queued_with_202() {
    let addr = spawn_relay(stub_probe_state(true)).await;

    let response = reqwest::Client::new()
        .post(format!("http://{addr}/demo"))
        .json(&json!({"a": 1}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 202);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Non-active service. Queued webhook.");
}

#[tokio::test]
async fn test_webhook_with_bad_body_is_rejected_with_400() {
    let addr = spawn_relay(stub_probe_state(true)).await;
    let client = reqwest::Client::new();

    for body in ["", "not json"] {
        let response = client
            .post(format!("http://{addr}/demo"))
            .header("content-type", "application/json")
            .body(body.to_string())
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 400);
    }
}

#[tokio::test]
async fn test_webhook_forwarded_to_registered_service_returns_200() {
    let downstream = mock_client_service().await;
    Mock::given(method("POST"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&downstream)
        .await;

    let addr = spawn_relay(http_probe_state()).await;
    let client = reqwest::Client::new();

    client
        .post(format!("http://{addr}/demo/init"))
        .json(&json!({"port": downstream.address().port()}))
        .send()
        .await
        .unwrap();

    let response = client
        .post(format!("http://{addr}/demo"))
        .json(&json!({"a": 1}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Sent webhook!");
}

#[tokio::test]
async fn test_downstream_rejection_surfaces_as_502() {
    let downstream = mock_client_service().await;
    Mock::given(method("POST"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&downstream)
        .await;

    let addr = spawn_relay(http_probe_state()).await;
    let client = reqwest::Client::new();

    client
        .post(format!("http://{addr}/demo/init"))
        .json(&json!({"port": downstream.address().port()}))
        .send()
        .await
        .unwrap();

    let response = client
        .post(format!("http://{addr}/demo"))
        .json(&json!({"a": 1}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 502);
    let error: serde_json::Value = response.json().await.unwrap();
    assert_eq!(error["error"], "upstream_rejected");
}

#[tokio::test]
async fn test_registering_flushes_buffered_deliveries_as_one_merged_batch() {
    let addr = spawn_relay(http_probe_state()).await;
    let client = reqwest::Client::new();

    // Buffer two deliveries while the service is down.
    for payload in [json!({"a": 1}), json!({"b": 2})] {
        let response = client
            .post(format!("http://{addr}/demo"))
            .json(&payload)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 202);
    }

    let downstream = mock_client_service().await;
    Mock::given(method("POST"))
        .and(path("/batch"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&downstream)
        .await;

    let response = client
        .post(format!("http://{addr}/demo/init"))
        .json(&json!({"port": downstream.address().port()}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let forwarded: Vec<serde_json::Value> = downstream
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|request| request.url.path() == "/batch")
        .map(|request| serde_json::from_slice(&request.body).unwrap())
        .collect();
    assert_eq!(forwarded, vec![json!([{"a": 1}, {"b": 2}])]);

    // The buffer is empty afterward: the next webhook forwards alone.
    Mock::given(method("POST"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&downstream)
        .await;
    let response = client
        .post(format!("http://{addr}/demo"))
        .json(&json!({"c": 3}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
}
