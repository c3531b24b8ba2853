//! API error types with HTTP response mapping.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use common::{TransactionKey, TransactionResponse, TransactionType};
use relay::ErrorSignal;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// A classified relay failure, answered with the transaction body.
    Relay { key: TransactionKey, signal: ErrorSignal },
    /// Resource not found.
    NotFound(String),
    /// Internal server error.
    Internal(String),
}

impl ApiError {
    pub fn relay(key: TransactionKey, signal: ErrorSignal) -> Self {
        ApiError::Relay { key, signal }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Relay { key, signal } => {
                let status =
                    StatusCode::from_u16(signal.http_status).unwrap_or(StatusCode::BAD_REQUEST);
                let body = TransactionResponse::from(signal.to_outcome(&key));
                return (status, axum::Json(body)).into_response();
            }
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

/// Body that could not be read as a transaction request.
///
/// Syntax and shape errors are field-validation failures; anything else is
/// unclassified.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        let signal = match &rejection {
            JsonRejection::JsonSyntaxError(_) | JsonRejection::JsonDataError(_) => {
                ErrorSignal::field_validation(rejection.body_text())
            }
            _ => ErrorSignal::unknown(rejection.body_text()),
        };
        metrics::counter!("relay_requests_total", "result" => signal.kind.as_str()).increment(1);
        tracing::warn!(kind = %signal.kind, message = %signal.message, "rejected request body");

        ApiError::relay(
            TransactionKey::new(String::new(), TransactionType::CreditTransfer),
            signal,
        )
    }
}
