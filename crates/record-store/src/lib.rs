//! Durable keyed storage for transaction records.
//!
//! The store is the sole arbiter of idempotency: `insert` enforces uniqueness
//! of `(reference_number, transaction_type)` at the storage level, so the
//! relay's existence check is an optimization and never the correctness
//! mechanism.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod record;
pub mod store;

pub use common::{RecordId, TransactionKey, TransactionStatus, TransactionType};
pub use error::{RecordStoreError, Result};
pub use memory::InMemoryRecordStore;
pub use postgres::PostgresRecordStore;
pub use record::{InvalidAmount, TransactionRecord};
pub use store::RecordStore;
