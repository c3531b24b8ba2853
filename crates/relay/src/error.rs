//! Failure taxonomy and the classifier mapping store and downstream errors
//! onto it.

use common::{TransactionKey, TransactionOutcome, TransactionStatus};
use downstream::DownstreamError;
use record_store::RecordStoreError;
use thiserror::Error;

/// Status used when a classifier produced an out-of-range HTTP status.
pub const FALLBACK_HTTP_STATUS: u16 = 400;

/// Category of a pipeline failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    FieldValidation,
    Duplicate,
    Database,
    Timeout,
    Http,
    ResponseDecode,
    Unknown,
}

impl ErrorKind {
    /// Returns the HTTP status a failure of this kind is answered with.
    pub fn http_status(&self) -> u16 {
        match self {
            ErrorKind::Duplicate => 409,
            ErrorKind::Timeout => 408,
            ErrorKind::FieldValidation
            | ErrorKind::Database
            | ErrorKind::Http
            | ErrorKind::ResponseDecode
            | ErrorKind::Unknown => 400,
        }
    }

    /// Returns the kind name, used as a metric label.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::FieldValidation => "field_validation",
            ErrorKind::Duplicate => "duplicate",
            ErrorKind::Database => "database",
            ErrorKind::Timeout => "timeout",
            ErrorKind::Http => "http",
            ErrorKind::ResponseDecode => "response_decode",
            ErrorKind::Unknown => "unknown",
        }
    }

    /// Returns the record status a failure of this kind ends in.
    pub fn outcome_status(&self) -> TransactionStatus {
        match self {
            ErrorKind::Timeout => TransactionStatus::Timeout,
            _ => TransactionStatus::Failure,
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Clamps a classifier status into `[100, 599]`, falling back to 400.
pub fn normalize_http_status(status: i64) -> u16 {
    match u16::try_from(status) {
        Ok(s) if (100..=599).contains(&s) => s,
        _ => FALLBACK_HTTP_STATUS,
    }
}

/// A classified pipeline failure.
///
/// Carries everything needed to answer the caller and to build the outcome
/// written into the stored record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ErrorSignal {
    pub http_status: u16,
    pub kind: ErrorKind,
    pub message: String,
}

impl ErrorSignal {
    /// Creates a signal with the default status of `kind`.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            http_status: kind.http_status(),
            kind,
            message: message.into(),
        }
    }

    /// Overrides the HTTP status, normalizing out-of-range values.
    pub fn with_status(mut self, status: i64) -> Self {
        self.http_status = normalize_http_status(status);
        self
    }

    pub fn field_validation(detail: impl std::fmt::Display) -> Self {
        Self::new(
            ErrorKind::FieldValidation,
            format!("Field validation failed. {detail}"),
        )
    }

    pub fn duplicate() -> Self {
        Self::new(
            ErrorKind::Duplicate,
            "De-dup: the request is a duplicate and has already been processed.",
        )
    }

    pub fn unknown(detail: impl std::fmt::Display) -> Self {
        Self::new(
            ErrorKind::Unknown,
            format!("Could not process the request. {detail}"),
        )
    }

    /// Builds the failure outcome reconciled into the record for `key`.
    ///
    /// The message is carried verbatim as the status description.
    pub fn to_outcome(&self, key: &TransactionKey) -> TransactionOutcome {
        TransactionOutcome::failed(key, self.kind.outcome_status(), self.message.clone())
    }
}

impl From<RecordStoreError> for ErrorSignal {
    fn from(err: RecordStoreError) -> Self {
        match err {
            RecordStoreError::DuplicateKey(_) => ErrorSignal::duplicate(),
            other => ErrorSignal::new(
                ErrorKind::Database,
                format!("Database error while saving transaction: {other}"),
            ),
        }
    }
}

impl From<DownstreamError> for ErrorSignal {
    fn from(err: DownstreamError) -> Self {
        if err.is_timeout() {
            return ErrorSignal::new(
                ErrorKind::Timeout,
                format!(
                    "Did not receive a response from the processor, possibly due to timeout. {err}"
                ),
            );
        }

        match err {
            DownstreamError::ResponseDecode(_) => ErrorSignal::new(
                ErrorKind::ResponseDecode,
                format!("Could not process the received response. {err}"),
            ),
            DownstreamError::Transport { .. } | DownstreamError::NoResponse { .. } => {
                ErrorSignal::new(
                    ErrorKind::Http,
                    format!("HTTP call to the processor was unsuccessful. {err}"),
                )
            }
            DownstreamError::Encode(_) => ErrorSignal::unknown(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use common::TransactionType;

    use super::*;

    fn key() -> TransactionKey {
        TransactionKey::new("TX99887766", TransactionType::CreditTransfer)
    }

    #[test]
    fn test_default_statuses() {
        assert_eq!(ErrorKind::FieldValidation.http_status(), 400);
        assert_eq!(ErrorKind::Duplicate.http_status(), 409);
        assert_eq!(ErrorKind::Database.http_status(), 400);
        assert_eq!(ErrorKind::Timeout.http_status(), 408);
        assert_eq!(ErrorKind::Http.http_status(), 400);
        assert_eq!(ErrorKind::ResponseDecode.http_status(), 400);
        assert_eq!(ErrorKind::Unknown.http_status(), 400);
    }

    #[test]
    fn test_status_clamping() {
        assert_eq!(normalize_http_status(0), 400);
        assert_eq!(normalize_http_status(99), 400);
        assert_eq!(normalize_http_status(600), 400);
        assert_eq!(normalize_http_status(-408), 400);
        assert_eq!(normalize_http_status(i64::MAX), 400);
        assert_eq!(normalize_http_status(100), 100);
        assert_eq!(normalize_http_status(599), 599);
        assert_eq!(normalize_http_status(408), 408);

        let signal = ErrorSignal::unknown("boom").with_status(0);
        assert_eq!(signal.http_status, 400);
    }

    #[test]
    fn test_duplicate_key_classified_as_duplicate() {
        let signal: ErrorSignal = RecordStoreError::DuplicateKey(key()).into();
        assert_eq!(signal.kind, ErrorKind::Duplicate);
        assert_eq!(signal.http_status, 409);
        assert!(signal.message.contains("duplicate"));
    }

    #[test]
    fn test_storage_fault_classified_as_database() {
        let signal: ErrorSignal =
            RecordStoreError::Unavailable("connection refused".to_string()).into();
        assert_eq!(signal.kind, ErrorKind::Database);
        assert_eq!(signal.http_status, 400);
        assert!(signal.message.contains("connection refused"));
    }

    #[test]
    fn test_timeout_predicate_drives_classification() {
        let timeout: ErrorSignal = DownstreamError::transport("Read timed out", false).into();
        assert_eq!(timeout.kind, ErrorKind::Timeout);
        assert_eq!(timeout.http_status, 408);

        let refused: ErrorSignal = DownstreamError::transport("Connection refused", false).into();
        assert_eq!(refused.kind, ErrorKind::Http);
        assert_eq!(refused.http_status, 400);

        let empty: ErrorSignal = DownstreamError::NoResponse { status_code: 0 }.into();
        assert_eq!(empty.kind, ErrorKind::Timeout);
    }

    #[test]
    fn test_decode_failure_is_not_timeout() {
        let signal: ErrorSignal = DownstreamError::ResponseDecode("bad body".to_string()).into();
        assert_eq!(signal.kind, ErrorKind::ResponseDecode);
        assert_eq!(signal.to_outcome(&key()).status, TransactionStatus::Failure);
    }

    #[test]
    fn test_outcome_carries_message_verbatim() {
        let signal: ErrorSignal = DownstreamError::transport("socket time out", false).into();
        let outcome = signal.to_outcome(&key());

        assert_eq!(outcome.status, TransactionStatus::Timeout);
        assert_eq!(outcome.status_code, TransactionStatus::Timeout.code());
        assert_eq!(outcome.status_desc, signal.message);
        assert_eq!(outcome.key(), key());
    }
}
