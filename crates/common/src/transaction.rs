//! Wire shapes shared by the caller-facing API, the relay and the downstream
//! processor.

use serde::{Deserialize, Serialize};

use crate::types::{TransactionKey, TransactionStatus, TransactionType};

/// Inbound transaction request.
///
/// Every field defaults to an empty string so that a missing field surfaces
/// as a field-validation failure rather than a deserialization error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TransactionRequest {
    pub reference_number: String,
    pub transaction_type: String,
    pub sender_name: String,
    pub receiver_name: String,
    /// Decimal amount as text, at most two fraction digits.
    pub amount: String,
    pub currency: String,
    pub channel_id: String,
}

/// Outcome of one transaction attempt, from either the downstream processor
/// or a failure path. The only shape consumed by reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionOutcome {
    pub reference_number: String,
    pub transaction_type: TransactionType,
    pub status: TransactionStatus,
    pub status_code: String,
    pub status_desc: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub downstream_transaction_id: Option<String>,
}

impl TransactionOutcome {
    /// Builds a failure outcome whose code is derived from `status`.
    pub fn failed(
        key: &TransactionKey,
        status: TransactionStatus,
        status_desc: impl Into<String>,
    ) -> Self {
        Self {
            reference_number: key.reference_number.clone(),
            transaction_type: key.transaction_type,
            status,
            status_code: status.code().to_string(),
            status_desc: status_desc.into(),
            downstream_transaction_id: None,
        }
    }

    /// Returns the idempotency key this outcome belongs to.
    pub fn key(&self) -> TransactionKey {
        TransactionKey::new(self.reference_number.clone(), self.transaction_type)
    }
}

/// Caller-facing response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionResponse {
    pub reference_number: String,
    pub status: TransactionStatus,
    pub status_code: String,
    pub status_desc: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub downstream_transaction_id: Option<String>,
}

impl From<TransactionOutcome> for TransactionResponse {
    fn from(outcome: TransactionOutcome) -> Self {
        Self {
            reference_number: outcome.reference_number,
            status: outcome.status,
            status_code: outcome.status_code,
            status_desc: outcome.status_desc,
            downstream_transaction_id: outcome.downstream_transaction_id,
        }
    }
}
