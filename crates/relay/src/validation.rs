//! Field-level validation of inbound transaction requests.

use common::TransactionRequest;

/// A single failed field rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Field errors collected for one request, in field order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationResult {
    pub errors: Vec<FieldError>,
}

impl ValidationResult {
    /// A result with no errors.
    pub fn ok() -> Self {
        Self::default()
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Returns the error reported to the caller.
    pub fn first(&self) -> Option<&FieldError> {
        self.errors.first()
    }
}

impl From<Vec<FieldError>> for ValidationResult {
    fn from(errors: Vec<FieldError>) -> Self {
        Self { errors }
    }
}

/// Validates every field of the request.
///
/// Each field contributes at most one error, the first of its rules that
/// fails.
pub fn validate(request: &TransactionRequest) -> ValidationResult {
    let checks = [
        reference_number(&request.reference_number),
        transaction_type(&request.transaction_type),
        name("senderName", "Sender name", &request.sender_name),
        name("receiverName", "Receiver name", &request.receiver_name),
        amount(&request.amount),
        currency(&request.currency),
        channel_id(&request.channel_id),
    ];

    checks.into_iter().flatten().collect::<Vec<_>>().into()
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

fn reference_number(value: &str) -> Option<FieldError> {
    const FIELD: &str = "referenceNumber";
    if is_blank(value) {
        return Some(FieldError::new(FIELD, "Reference number is required"));
    }
    if !(8..=20).contains(&value.chars().count()) {
        return Some(FieldError::new(
            FIELD,
            "Reference number must be between 8 and 20 characters",
        ));
    }
    if !value.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return Some(FieldError::new(
            FIELD,
            "Reference number must only contain letters, numbers, and dashes",
        ));
    }
    None
}

fn transaction_type(value: &str) -> Option<FieldError> {
    const FIELD: &str = "transactionType";
    if is_blank(value) {
        return Some(FieldError::new(FIELD, "Transaction type is required"));
    }
    if !value
        .chars()
        .all(|c| c.is_ascii_alphabetic() || c == '_' || c == '-')
    {
        return Some(FieldError::new(
            FIELD,
            "Transaction type must be letters, underscores and dashes only",
        ));
    }
    None
}

fn name(field: &'static str, label: &str, value: &str) -> Option<FieldError> {
    if is_blank(value) {
        return Some(FieldError::new(field, format!("{label} is required")));
    }
    if value.chars().count() > 100 {
        return Some(FieldError::new(
            field,
            format!("{label} must not exceed 100 characters"),
        ));
    }
    if !value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, ' ' | '.' | '\'' | '-'))
    {
        return Some(FieldError::new(
            field,
            format!("{label} contains invalid characters"),
        ));
    }
    None
}

/// Integer digits a stored amount can carry (`NUMERIC(18, 2)`).
const MAX_WHOLE_DIGITS: usize = 16;

fn amount(value: &str) -> Option<FieldError> {
    const FIELD: &str = "amount";
    if is_blank(value) {
        return Some(FieldError::new(FIELD, "Amount is required"));
    }

    let (whole, fraction) = match value.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (value, None),
    };
    let digits = |s: &str| !s.is_empty() && s.chars().all(|c| c.is_ascii_digit());
    let well_formed = digits(whole)
        && fraction.is_none_or(|f| digits(f) && f.len() <= 2);
    if !well_formed {
        return Some(FieldError::new(
            FIELD,
            "Amount must be a valid number with up to two decimal places",
        ));
    }

    let non_zero = value.chars().any(|c| matches!(c, '1'..='9'));
    if !non_zero {
        return Some(FieldError::new(FIELD, "Amount must be greater than zero"));
    }
    if whole.trim_start_matches('0').len() > MAX_WHOLE_DIGITS {
        return Some(FieldError::new(
            FIELD,
            "Amount must not exceed 16 digits before the decimal point",
        ));
    }
    None
}

fn currency(value: &str) -> Option<FieldError> {
    const FIELD: &str = "currency";
    if is_blank(value) {
        return Some(FieldError::new(FIELD, "Currency is required"));
    }
    if value.chars().count() != 3 {
        return Some(FieldError::new(FIELD, "Currency must be a 3-letter ISO code"));
    }
    if !value.chars().all(|c| c.is_ascii_uppercase()) {
        return Some(FieldError::new(
            FIELD,
            "Currency must be uppercase 3-letter code",
        ));
    }
    None
}

fn channel_id(value: &str) -> Option<FieldError> {
    const FIELD: &str = "channelId";
    if is_blank(value) {
        return Some(FieldError::new(FIELD, "Channel ID is required"));
    }
    if value.chars().count() > 20 {
        return Some(FieldError::new(
            FIELD,
            "Channel ID must not exceed 20 characters",
        ));
    }
    if !value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Some(FieldError::new(
            FIELD,
            "Channel ID must only contain letters, numbers, dashes, and underscores",
        ));
    }
    None
}
