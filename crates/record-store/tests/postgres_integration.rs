//! PostgreSQL integration tests
//!
//! These tests share one PostgreSQL container and truncate the table between
//! tests, so they are serialized. Docker must be available. Run with:
//!
//! ```bash
//! cargo test -p record-store --test postgres_integration
//! ```

use std::sync::Arc;

use record_store::{
    PostgresRecordStore, RecordStore, RecordStoreError, TransactionKey, TransactionRecord,
    TransactionStatus, TransactionType,
};
use rust_decimal::Decimal;
use serial_test::serial;
use sqlx::PgPool;
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

/// Shared container info - container stays alive for all tests
struct ContainerInfo {
    #[allow(dead_code)] // Container must stay alive for tests
    container: ContainerAsync<Postgres>,
    connection_string: String,
}

static CONTAINER: OnceCell<Arc<ContainerInfo>> = OnceCell::const_new();

async fn get_container_info() -> Arc<ContainerInfo> {
    CONTAINER
        .get_or_init(|| async {
            let container = Postgres::default().start().await.unwrap();

            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432).await.unwrap();

            let connection_string =
                format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

            let temp_pool = PgPool::connect(&connection_string).await.unwrap();
            PostgresRecordStore::new(temp_pool.clone())
                .run_migrations()
                .await
                .unwrap();
            temp_pool.close().await;

            Arc::new(ContainerInfo {
                container,
                connection_string,
            })
        })
        .await
        .clone()
}

/// Get a fresh store with its own pool and an empty table
async fn get_test_store() -> PostgresRecordStore {
    let info = get_container_info().await;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&info.connection_string)
        .await
        .unwrap();

    sqlx::query("TRUNCATE TABLE transaction_records")
        .execute(&pool)
        .await
        .unwrap();

    PostgresRecordStore::new(pool)
}

fn create_test_record(reference_number: &str) -> TransactionRecord {
    TransactionRecord::builder()
        .reference_number(reference_number)
        .transaction_type(TransactionType::CreditTransfer)
        .sender_name("Alice O'Neil")
        .receiver_name("Bob")
        .amount(Decimal::new(15050, 2))
        .currency("KES")
        .channel_id("MOBILE_APP")
        .build()
}

#[tokio::test]
#[serial]
async fn insert_and_fetch_record() {
    let store = get_test_store().await;
    let record = create_test_record("TX99887766");
    let key = record.key();

    assert!(!store.exists(&key).await.unwrap());
    store.insert(record.clone()).await.unwrap();
    assert!(store.exists(&key).await.unwrap());

    let fetched = store.fetch(&key).await.unwrap().unwrap();
    assert_eq!(fetched.id, record.id);
    assert_eq!(fetched.amount, Decimal::new(15050, 2));
    assert_eq!(fetched.currency, "KES");
    assert_eq!(fetched.status, TransactionStatus::Initialized);
}

#[tokio::test]
#[serial]
async fn unique_constraint_reports_duplicate_key() {
    let store = get_test_store().await;
    store.insert(create_test_record("TX99887766")).await.unwrap();

    let result = store.insert(create_test_record("TX99887766")).await;

    assert!(matches!(result, Err(RecordStoreError::DuplicateKey(_))));
}

#[tokio::test]
#[serial]
async fn concurrent_inserts_admit_exactly_one() {
    let store = get_test_store().await;

    let mut handles = Vec::new();
    for _ in 0..8 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            store.insert(create_test_record("TX12345678")).await
        }));
    }

    let mut ok = 0;
    let mut duplicates = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(()) => ok += 1,
            Err(RecordStoreError::DuplicateKey(_)) => duplicates += 1,
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(ok, 1);
    assert_eq!(duplicates, 7);
}

#[tokio::test]
#[serial]
async fn update_changes_outcome_fields() {
    let store = get_test_store().await;
    let record = create_test_record("TX99887766");
    store.insert(record.clone()).await.unwrap();

    let mut updated = record.clone();
    updated.status = TransactionStatus::Success;
    updated.status_code = "00".to_string();
    updated.status_desc = "Approved".to_string();
    updated.updated_at = chrono::Utc::now();
    store.update(&updated).await.unwrap();

    let fetched = store.fetch(&record.key()).await.unwrap().unwrap();
    assert_eq!(fetched.status, TransactionStatus::Success);
    assert_eq!(fetched.status_code, "00");
    assert_eq!(fetched.status_desc, "Approved");
    assert_eq!(fetched.created_at.timestamp(), record.created_at.timestamp());
}

#[tokio::test]
#[serial]
async fn update_missing_record_is_not_found() {
    let store = get_test_store().await;
    let result = store.update(&create_test_record("TX00000000")).await;
    assert!(matches!(result, Err(RecordStoreError::NotFound(_))));
}

#[tokio::test]
#[serial]
async fn fetch_missing_record_is_none() {
    let store = get_test_store().await;
    let key = TransactionKey::new("TX00000000", TransactionType::CreditTransfer);
    assert!(store.fetch(&key).await.unwrap().is_none());
}
