//! End-to-end tests of the REST client against a local processor.

use std::net::SocketAddr;
use std::time::Duration;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::post;
use common::{TransactionRequest, TransactionStatus, TransactionType};
use downstream::{
    DownstreamClient, DownstreamError, ReqwestTransport, RestDownstreamClient, TransportConfig,
};

async fn approve(body: String) -> (StatusCode, String) {
    let request: TransactionRequest = serde_json::from_str(&body).unwrap();
    let reply = serde_json::json!({
        "rrn": request.reference_number,
        "status": "SUCCESS",
        "statusCode": "00",
        "statusDesc": "Approved",
        "tranId": "DS-9000"
    });
    (StatusCode::OK, reply.to_string())
}

async fn slow() -> &'static str {
    tokio::time::sleep(Duration::from_secs(5)).await;
    r#"{"status":"SUCCESS","statusCode":"00"}"#
}

async fn empty() -> StatusCode {
    StatusCode::OK
}

async fn spawn_processor() -> SocketAddr {
    let app = Router::new()
        .route("/approve", post(approve))
        .route("/slow", post(slow))
        .route("/empty", post(empty));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn client(url: String, request_timeout: Duration) -> RestDownstreamClient<ReqwestTransport> {
    let config = TransportConfig {
        connect_timeout: Duration::from_secs(1),
        request_timeout,
        ..TransportConfig::default()
    };
    RestDownstreamClient::new(url, ReqwestTransport::new(&config).unwrap())
}

fn request() -> TransactionRequest {
    TransactionRequest {
        reference_number: "TX99887766".to_string(),
        transaction_type: "CREDIT_TRANSFER".to_string(),
        sender_name: "Alice".to_string(),
        receiver_name: "Bob".to_string(),
        amount: "150.50".to_string(),
        currency: "KES".to_string(),
        channel_id: "MOBILE".to_string(),
    }
}

#[tokio::test]
async fn round_trip_against_local_processor() {
    let addr = spawn_processor().await;
    let client = client(format!("http://{addr}/approve"), Duration::from_secs(5));

    let outcome = client
        .send(&request(), TransactionType::CreditTransfer)
        .await
        .unwrap();

    assert_eq!(outcome.status, TransactionStatus::Success);
    assert_eq!(outcome.status_desc, "Approved");
    assert_eq!(outcome.downstream_transaction_id.as_deref(), Some("DS-9000"));
}

#[tokio::test]
async fn deadline_expiry_is_timeout() {
    let addr = spawn_processor().await;
    let client = client(format!("http://{addr}/slow"), Duration::from_millis(200));

    let err = client
        .send(&request(), TransactionType::CreditTransfer)
        .await
        .unwrap_err();

    assert!(matches!(err, DownstreamError::Transport { timeout: true, .. }));
}

#[tokio::test]
async fn empty_reply_is_timeout_class() {
    let addr = spawn_processor().await;
    let client = client(format!("http://{addr}/empty"), Duration::from_secs(5));

    let err = client
        .send(&request(), TransactionType::CreditTransfer)
        .await
        .unwrap_err();

    assert!(matches!(err, DownstreamError::NoResponse { .. }));
}

#[tokio::test]
async fn refused_connection_is_not_timeout() {
    // Bind then drop to get a port with nothing listening.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = client(format!("http://{addr}/approve"), Duration::from_secs(5));
    let err = client
        .send(&request(), TransactionType::CreditTransfer)
        .await
        .unwrap_err();

    assert!(matches!(err, DownstreamError::Transport { timeout: false, .. }));
}
