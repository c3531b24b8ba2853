use thiserror::Error;

use crate::TransactionKey;

/// Errors that can occur when interacting with the record store.
#[derive(Debug, Error)]
pub enum RecordStoreError {
    /// A record with the same `(reference_number, transaction_type)` exists.
    #[error("Duplicate transaction record for {0}")]
    DuplicateKey(TransactionKey),

    /// No record exists for the key being updated.
    #[error("Transaction record not found: {0}")]
    NotFound(TransactionKey),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A stored row could not be mapped back into a record.
    #[error("Corrupt record: {0}")]
    Corrupt(String),

    /// The storage layer refused the operation (connectivity, injected fault).
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

impl RecordStoreError {
    /// Returns true for the uniqueness violation on the idempotency key.
    pub fn is_duplicate(&self) -> bool {
        matches!(self, RecordStoreError::DuplicateKey(_))
    }
}

/// Result type for record store operations.
pub type Result<T> = std::result::Result<T, RecordStoreError>;
