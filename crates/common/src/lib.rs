//! Shared vocabulary for the transaction relay: identifiers, closed enums and
//! the wire shapes exchanged between the caller, the relay and the downstream
//! processor.

pub mod transaction;
pub mod types;

pub use transaction::{TransactionOutcome, TransactionRequest, TransactionResponse};
pub use types::{
    ParseTransactionStatusError, ParseTransactionTypeError, RecordId, TransactionKey,
    TransactionStatus, TransactionType,
};
