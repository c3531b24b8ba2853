use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{RecordStore, RecordStoreError, Result, TransactionKey, TransactionRecord};

#[derive(Debug, Default)]
struct Faults {
    fail_on_insert: AtomicBool,
    fail_on_update: AtomicBool,
    fail_on_fetch: AtomicBool,
}

/// In-memory record store implementation for testing and local runs.
///
/// Uniqueness is checked and the record inserted under one write lock, which
/// gives the same guarantee as the PostgreSQL unique constraint.
#[derive(Clone, Default)]
pub struct InMemoryRecordStore {
    records: Arc<RwLock<HashMap<TransactionKey, TransactionRecord>>>,
    faults: Arc<Faults>,
}

impl InMemoryRecordStore {
    /// Creates a new empty in-memory record store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of records stored.
    pub async fn record_count(&self) -> usize {
        self.records.read().await.len()
    }

    /// Clears all records.
    pub async fn clear(&self) {
        self.records.write().await.clear();
    }

    /// Configures subsequent `insert` calls to fail with `Unavailable`.
    pub fn set_fail_on_insert(&self, fail: bool) {
        self.faults.fail_on_insert.store(fail, Ordering::SeqCst);
    }

    /// Configures subsequent `update` calls to fail with `Unavailable`.
    pub fn set_fail_on_update(&self, fail: bool) {
        self.faults.fail_on_update.store(fail, Ordering::SeqCst);
    }

    /// Configures subsequent `fetch` calls to fail with `Unavailable`.
    pub fn set_fail_on_fetch(&self, fail: bool) {
        self.faults.fail_on_fetch.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn exists(&self, key: &TransactionKey) -> Result<bool> {
        Ok(self.records.read().await.contains_key(key))
    }

    async fn insert(&self, record: TransactionRecord) -> Result<()> {
        if self.faults.fail_on_insert.load(Ordering::SeqCst) {
            return Err(RecordStoreError::Unavailable(
                "insert rejected by storage".to_string(),
            ));
        }

        let key = record.key();
        let mut records = self.records.write().await;
        if records.contains_key(&key) {
            return Err(RecordStoreError::DuplicateKey(key));
        }
        records.insert(key, record);
        Ok(())
    }

    async fn fetch(&self, key: &TransactionKey) -> Result<Option<TransactionRecord>> {
        if self.faults.fail_on_fetch.load(Ordering::SeqCst) {
            return Err(RecordStoreError::Unavailable(
                "fetch rejected by storage".to_string(),
            ));
        }
        Ok(self.records.read().await.get(key).cloned())
    }

    async fn update(&self, record: &TransactionRecord) -> Result<()> {
        if self.faults.fail_on_update.load(Ordering::SeqCst) {
            return Err(RecordStoreError::Unavailable(
                "update rejected by storage".to_string(),
            ));
        }

        let key = record.key();
        let mut records = self.records.write().await;
        match records.get_mut(&key) {
            Some(stored) => {
                stored.status = record.status;
                stored.status_code = record.status_code.clone();
                stored.status_desc = record.status_desc.clone();
                stored.updated_at = record.updated_at;
                Ok(())
            }
            None => Err(RecordStoreError::NotFound(key)),
        }
    }
}
