use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Storage identity of a transaction record.
///
/// The idempotency key is [`TransactionKey`]; this ID only names the row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(Uuid);

impl RecordId {
    /// Creates a new random record ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a record ID from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Closed category of operation. Scopes the idempotency key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    CreditTransfer,
}

impl TransactionType {
    /// Returns the canonical wire/storage name.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::CreditTransfer => "CREDIT_TRANSFER",
        }
    }
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error returned when a string does not name a [`TransactionType`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseTransactionTypeError(pub String);

impl std::fmt::Display for ParseTransactionTypeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Invalid transaction type: {}", self.0)
    }
}

impl std::error::Error for ParseTransactionTypeError {}

impl FromStr for TransactionType {
    type Err = ParseTransactionTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CREDIT_TRANSFER" => Ok(TransactionType::CreditTransfer),
            other => Err(ParseTransactionTypeError(other.to_string())),
        }
    }
}

/// Lifecycle status of a transaction record.
///
/// ```text
/// Initialized ──┬──► Success
///               ├──► Failure
///               └──► Timeout
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    Initialized,
    Success,
    Failure,
    Timeout,
}

impl TransactionStatus {
    /// Returns the status name as stored and sent on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Initialized => "INITIALIZED",
            TransactionStatus::Success => "SUCCESS",
            TransactionStatus::Failure => "FAILURE",
            TransactionStatus::Timeout => "TIMEOUT",
        }
    }

    /// Returns the numeric status code associated with this status.
    pub fn code(&self) -> &'static str {
        match self {
            TransactionStatus::Success => "00",
            TransactionStatus::Initialized => "09",
            TransactionStatus::Timeout => "68",
            TransactionStatus::Failure => "96",
        }
    }

    /// Returns the default human description for this status.
    pub fn description(&self) -> &'static str {
        match self {
            TransactionStatus::Initialized => "Transaction initialized, awaiting processor response",
            TransactionStatus::Success => "Transaction processed successfully",
            TransactionStatus::Failure => "Transaction failed",
            TransactionStatus::Timeout => "No response received from processor",
        }
    }

    /// Returns true once the record has left `Initialized`.
    pub fn is_final(&self) -> bool {
        !matches!(self, TransactionStatus::Initialized)
    }
}

impl std::fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error returned when a string does not name a [`TransactionStatus`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseTransactionStatusError(pub String);

impl std::fmt::Display for ParseTransactionStatusError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Unknown transaction status: {}", self.0)
    }
}

impl std::error::Error for ParseTransactionStatusError {}

impl FromStr for TransactionStatus {
    type Err = ParseTransactionStatusError;

    /// Parses a status name, ignoring ASCII case and surrounding whitespace.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "INITIALIZED" => Ok(TransactionStatus::Initialized),
            "SUCCESS" => Ok(TransactionStatus::Success),
            "FAILURE" => Ok(TransactionStatus::Failure),
            "TIMEOUT" => Ok(TransactionStatus::Timeout),
            _ => Err(ParseTransactionStatusError(s.to_string())),
        }
    }
}

/// Idempotency key: `(reference_number, transaction_type)` is unique.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionKey {
    pub reference_number: String,
    pub transaction_type: TransactionType,
}

impl TransactionKey {
    pub fn new(reference_number: impl Into<String>, transaction_type: TransactionType) -> Self {
        Self {
            reference_number: reference_number.into(),
            transaction_type,
        }
    }
}

impl std::fmt::Display for TransactionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.transaction_type, self.reference_number)
    }
}
