use async_trait::async_trait;

use crate::{Result, TransactionKey, TransactionRecord};

/// Core trait for record store implementations.
///
/// Shared by request tasks and reconciliation workers, so all
/// implementations must be thread-safe (Send + Sync). Callers hold no locks
/// across calls; atomicity comes from the store itself.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Returns true if a record exists for the key.
    ///
    /// Must observe any record whose `insert` has already returned.
    async fn exists(&self, key: &TransactionKey) -> Result<bool>;

    /// Inserts a new record.
    ///
    /// Fails with `DuplicateKey` if the key already exists. The write is
    /// acknowledged: on `Ok` the record is visible to `exists`/`fetch`.
    async fn insert(&self, record: TransactionRecord) -> Result<()>;

    /// Fetches the record for the key, if any.
    async fn fetch(&self, key: &TransactionKey) -> Result<Option<TransactionRecord>>;

    /// Overwrites the outcome and temporal fields of an existing record.
    ///
    /// Fails with `NotFound` if no record exists for the record's key.
    async fn update(&self, record: &TransactionRecord) -> Result<()>;
}
