use std::str::FromStr;

use chrono::{DateTime, Utc};
use common::TransactionOutcome;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{RecordId, TransactionKey, TransactionStatus, TransactionType};

/// Scale of stored amounts (minor units).
pub const AMOUNT_SCALE: u32 = 2;

/// Total digits of a stored amount, matching `NUMERIC(18, 2)`.
pub const AMOUNT_PRECISION: u32 = 18;

/// The durable entity for one transaction attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    pub id: RecordId,
    pub reference_number: String,
    pub transaction_type: TransactionType,
    pub sender_name: String,
    pub receiver_name: String,
    pub amount: Decimal,
    pub currency: String,
    pub channel_id: String,
    pub status: TransactionStatus,
    pub status_code: String,
    pub status_desc: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Error returned when an amount cannot be stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidAmount(pub String);

impl std::fmt::Display for InvalidAmount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Amount must be a valid number with up to two decimal places: {}", self.0)
    }
}

impl std::error::Error for InvalidAmount {}

impl TransactionRecord {
    /// Creates a builder for an `Initialized` record.
    pub fn builder() -> TransactionRecordBuilder {
        TransactionRecordBuilder::default()
    }

    /// Returns the idempotency key of this record.
    pub fn key(&self) -> TransactionKey {
        TransactionKey::new(self.reference_number.clone(), self.transaction_type)
    }

    /// Parses a textual amount into a scale-2 decimal.
    ///
    /// Rejects values with more than two fraction digits instead of rounding,
    /// and values too large for the stored precision.
    pub fn parse_amount(raw: &str) -> Result<Decimal, InvalidAmount> {
        let mut amount =
            Decimal::from_str(raw.trim()).map_err(|_| InvalidAmount(raw.to_string()))?;
        let limit = Decimal::from(10_i64.pow(AMOUNT_PRECISION - AMOUNT_SCALE));
        if amount.scale() > AMOUNT_SCALE || amount.abs() >= limit {
            return Err(InvalidAmount(raw.to_string()));
        }
        amount.rescale(AMOUNT_SCALE);
        Ok(amount)
    }

    /// Copies the outcome fields onto the record and bumps `updated_at`.
    pub fn apply_outcome(&mut self, outcome: &TransactionOutcome) {
        self.status = outcome.status;
        self.status_code = outcome.status_code.clone();
        self.status_desc = outcome.status_desc.clone();
        self.updated_at = Utc::now();
    }
}

/// Builder for [`TransactionRecord`]. Records always start `Initialized`.
#[derive(Debug, Default)]
pub struct TransactionRecordBuilder {
    reference_number: Option<String>,
    transaction_type: Option<TransactionType>,
    sender_name: String,
    receiver_name: String,
    amount: Decimal,
    currency: String,
    channel_id: String,
}

impl TransactionRecordBuilder {
    pub fn reference_number(mut self, reference_number: impl Into<String>) -> Self {
        self.reference_number = Some(reference_number.into());
        self
    }

    pub fn transaction_type(mut self, transaction_type: TransactionType) -> Self {
        self.transaction_type = Some(transaction_type);
        self
    }

    pub fn sender_name(mut self, sender_name: impl Into<String>) -> Self {
        self.sender_name = sender_name.into();
        self
    }

    pub fn receiver_name(mut self, receiver_name: impl Into<String>) -> Self {
        self.receiver_name = receiver_name.into();
        self
    }

    pub fn amount(mut self, amount: Decimal) -> Self {
        self.amount = amount;
        self
    }

    pub fn currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = currency.into();
        self
    }

    pub fn channel_id(mut self, channel_id: impl Into<String>) -> Self {
        self.channel_id = channel_id.into();
        self
    }

    /// Builds the record.
    ///
    /// # Panics
    ///
    /// Panics if `reference_number` or `transaction_type` is not set.
    pub fn build(self) -> TransactionRecord {
        let now = Utc::now();
        let status = TransactionStatus::Initialized;
        TransactionRecord {
            id: RecordId::new(),
            reference_number: self.reference_number.expect("reference_number is required"),
            transaction_type: self.transaction_type.expect("transaction_type is required"),
            sender_name: self.sender_name,
            receiver_name: self.receiver_name,
            amount: self.amount,
            currency: self.currency,
            channel_id: self.channel_id,
            status,
            status_code: status.code().to_string(),
            status_desc: status.description().to_string(),
            created_at: now,
            updated_at: now,
        }
    }
}
