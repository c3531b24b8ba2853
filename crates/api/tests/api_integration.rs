//! Integration tests for the API server.

use std::sync::OnceLock;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use downstream::{InMemoryDownstreamClient, ScriptedReply};
use metrics_exporter_prometheus::PrometheusHandle;
use record_store::InMemoryRecordStore;
use relay::{ReconcilerConfig, ReconciliationWorker};
use serde_json::{Value, json};
use tower::ServiceExt;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            builder
                .install_recorder()
                .expect("failed to install Prometheus recorder")
        })
        .clone()
}

struct TestApp {
    app: axum::Router,
    store: InMemoryRecordStore,
    downstream: InMemoryDownstreamClient,
    worker: ReconciliationWorker,
}

fn setup() -> TestApp {
    let store = InMemoryRecordStore::new();
    let downstream = InMemoryDownstreamClient::new();
    let (state, worker) = api::create_state(
        store.clone(),
        downstream.clone(),
        &ReconcilerConfig::default(),
    );
    let app = api::create_app(state, get_metrics_handle());

    TestApp {
        app,
        store,
        downstream,
        worker,
    }
}

fn valid_body(reference_number: &str) -> Value {
    json!({
        "referenceNumber": reference_number,
        "transactionType": "CREDIT_TRANSFER",
        "senderName": "Alice",
        "receiverName": "Bob",
        "amount": "150.50",
        "currency": "KES",
        "channelId": "MOBILE"
    })
}

async fn read_json(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

async fn post_raw(app: &axum::Router, body: String) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/transaction")
                .header("content-type", "application/json")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    (status, read_json(response).await)
}

async fn post_transaction(app: &axum::Router, body: &Value) -> (StatusCode, Value) {
    post_raw(app, serde_json::to_string(body).unwrap()).await
}

async fn get_transaction(app: &axum::Router, reference_number: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/api/v1/transaction/{reference_number}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    (status, read_json(response).await)
}

#[tokio::test]
async fn test_health_check() {
    let t = setup();

    let response = t
        .app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = read_json(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["reconciliation"]["queueDepth"], 0);
}

#[tokio::test]
async fn test_successful_transaction() {
    let t = setup();
    t.downstream.push_reply(ScriptedReply::Respond {
        status: common::TransactionStatus::Success,
        status_code: "00".to_string(),
        status_desc: "Approved".to_string(),
    });

    let (status, json) = post_transaction(&t.app, &valid_body("TX99887766")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["referenceNumber"], "TX99887766");
    assert_eq!(json["status"], "SUCCESS");
    assert_eq!(json["statusCode"], "00");
    assert_eq!(json["statusDesc"], "Approved");
    assert_eq!(json["downstreamTransactionId"], "DS-0001");

    t.worker.shutdown().await;
    let (status, record) = get_transaction(&t.app, "TX99887766").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(record["status"], "SUCCESS");
    assert_eq!(record["amount"], "150.50");
    assert_eq!(record["currency"], "KES");
}

#[tokio::test]
async fn test_duplicate_transaction_returns_conflict() {
    let t = setup();

    let (first, _) = post_transaction(&t.app, &valid_body("TX99887766")).await;
    let (second, json) = post_transaction(&t.app, &valid_body("TX99887766")).await;

    assert_eq!(first, StatusCode::OK);
    assert_eq!(second, StatusCode::CONFLICT);
    assert_eq!(json["referenceNumber"], "TX99887766");
    assert_eq!(json["status"], "FAILURE");
    assert!(json["statusDesc"].as_str().unwrap().contains("duplicate"));
    assert!(json.get("downstreamTransactionId").is_none());

    t.worker.shutdown().await;
    assert_eq!(t.store.record_count().await, 1);
}

#[tokio::test]
async fn test_downstream_timeout_returns_request_timeout() {
    let t = setup();
    t.downstream
        .push_reply(ScriptedReply::TransportFailure("Read timed out".to_string()));

    let (status, json) = post_transaction(&t.app, &valid_body("TX99887766")).await;

    assert_eq!(status, StatusCode::REQUEST_TIMEOUT);
    assert_eq!(json["status"], "TIMEOUT");
    assert_eq!(json["statusCode"], "68");

    t.worker.shutdown().await;
    let (_, record) = get_transaction(&t.app, "TX99887766").await;
    assert_eq!(record["status"], "TIMEOUT");
}

#[tokio::test]
async fn test_missing_currency_returns_bad_request() {
    let t = setup();
    let mut body = valid_body("TX99887766");
    body.as_object_mut().unwrap().remove("currency");

    let (status, json) = post_transaction(&t.app, &body).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["status"], "FAILURE");
    assert_eq!(
        json["statusDesc"],
        "Field validation failed. Currency is required"
    );
    assert_eq!(t.downstream.call_count(), 0);

    t.worker.shutdown().await;
    assert_eq!(t.store.record_count().await, 0);
}

#[tokio::test]
async fn test_malformed_json_returns_structured_body() {
    let t = setup();

    let (status, json) = post_raw(&t.app, "{\"referenceNumber\": ".to_string()).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["status"], "FAILURE");
    assert!(
        json["statusDesc"]
            .as_str()
            .unwrap()
            .starts_with("Field validation failed.")
    );
}

#[tokio::test]
async fn test_missing_content_type_is_unknown_failure() {
    let t = setup();

    let response = t
        .app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/transaction")
                .body(Body::from(valid_body("TX99887766").to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = read_json(response).await;
    assert!(
        json["statusDesc"]
            .as_str()
            .unwrap()
            .starts_with("Could not process the request.")
    );
}

#[tokio::test]
async fn test_get_nonexistent_transaction() {
    let t = setup();

    let (status, json) = get_transaction(&t.app, "TX00000000").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(json["error"].as_str().unwrap().contains("TX00000000"));
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let t = setup();
    post_transaction(&t.app, &valid_body("TX55555555")).await;

    let response = t
        .app
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.contains("relay_requests_total"));
}
