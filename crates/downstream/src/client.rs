//! Downstream client trait and the REST implementation.

use async_trait::async_trait;
use common::{TransactionOutcome, TransactionRequest, TransactionStatus, TransactionType};
use serde::Deserialize;

use crate::error::{DownstreamError, Result};
use crate::transport::{HttpTransport, RawResponse};

/// Sends one transaction to the downstream processor.
#[async_trait]
pub trait DownstreamClient: Send + Sync {
    /// Sends the request once and returns the decoded outcome.
    async fn send(
        &self,
        request: &TransactionRequest,
        transaction_type: TransactionType,
    ) -> Result<TransactionOutcome>;
}

/// Body returned by the processor.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProcessorReply {
    #[serde(default, alias = "rrn")]
    reference_number: Option<String>,
    status: String,
    status_code: String,
    #[serde(default)]
    status_desc: Option<String>,
    #[serde(default, alias = "downstreamTransactionId")]
    tran_id: Option<String>,
}

/// REST client posting JSON to a single processor URL.
pub struct RestDownstreamClient<T: HttpTransport> {
    url: String,
    transport: T,
}

impl<T: HttpTransport> RestDownstreamClient<T> {
    pub fn new(url: impl Into<String>, transport: T) -> Self {
        Self {
            url: url.into(),
            transport,
        }
    }

    /// Returns the processor URL.
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl<T: HttpTransport> DownstreamClient for RestDownstreamClient<T> {
    #[tracing::instrument(
        skip(self, request),
        fields(reference_number = %request.reference_number, url = %self.url)
    )]
    async fn send(
        &self,
        request: &TransactionRequest,
        transaction_type: TransactionType,
    ) -> Result<TransactionOutcome> {
        let body = serde_json::to_string(request)?;
        tracing::info!("sending downstream request");

        let result = match self.transport.post(&self.url, body).await {
            Ok(raw) => interpret(&raw, &request.reference_number, transaction_type),
            Err(e) => Err(DownstreamError::transport(e.message, e.timed_out)),
        };

        let label = match &result {
            Ok(_) => "ok",
            Err(e) if e.is_timeout() => "timeout",
            Err(DownstreamError::ResponseDecode(_)) => "decode_error",
            Err(_) => "transport_error",
        };
        metrics::counter!("downstream_calls_total", "result" => label).increment(1);

        if let Err(ref e) = result {
            tracing::error!(error = %e, timeout = e.is_timeout(), "downstream call failed");
        }
        result
    }
}

/// Validates the raw response and decodes it into an outcome.
fn interpret(
    raw: &RawResponse,
    reference_number: &str,
    transaction_type: TransactionType,
) -> Result<TransactionOutcome> {
    if raw.body.trim().is_empty() || !(100..=599).contains(&raw.status_code) {
        return Err(DownstreamError::NoResponse {
            status_code: raw.status_code,
        });
    }

    tracing::info!(
        status_code = raw.status_code,
        status_message = %raw.reason_phrase,
        body = %raw.body,
        "downstream response received"
    );

    decode_reply(&raw.body, reference_number, transaction_type)
}

fn decode_reply(
    body: &str,
    reference_number: &str,
    transaction_type: TransactionType,
) -> Result<TransactionOutcome> {
    let reply: ProcessorReply = serde_json::from_str(body)
        .map_err(|e| DownstreamError::ResponseDecode(format!("malformed response body: {e}")))?;

    let status = reply
        .status
        .parse::<TransactionStatus>()
        .map_err(|e| DownstreamError::ResponseDecode(e.to_string()))?;
    if !status.is_final() {
        return Err(DownstreamError::ResponseDecode(format!(
            "processor returned non-final status {status}"
        )));
    }

    match reply.reference_number.as_deref() {
        Some(echoed) if echoed != reference_number => {
            tracing::warn!(echoed, "processor echoed a different reference number");
        }
        _ => {}
    }

    Ok(TransactionOutcome {
        reference_number: reference_number.to_string(),
        transaction_type,
        status,
        status_code: reply.status_code,
        status_desc: reply
            .status_desc
            .unwrap_or_else(|| status.description().to_string()),
        downstream_transaction_id: reply.tran_id,
    })
}
