//! HTTP transport seam and its reqwest implementation.

use std::time::Duration;

use async_trait::async_trait;

/// Raw HTTP response as returned by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status_code: u16,
    pub reason_phrase: String,
    pub body: String,
}

/// Failure raised by a transport before a complete response was read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportError {
    pub message: String,
    /// Set when the transport itself reported a deadline expiry.
    pub timed_out: bool,
}

impl std::fmt::Display for TransportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for TransportError {}

/// A transport capable of a JSON `POST`.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn post(&self, url: &str, body: String) -> Result<RawResponse, TransportError>;
}

/// Connection and deadline settings for [`ReqwestTransport`].
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub connect_timeout: Duration,
    /// Deadline for the whole call, including reading the body.
    pub request_timeout: Duration,
    pub pool_max_idle_per_host: usize,
    pub pool_idle_timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_millis(15_000),
            request_timeout: Duration::from_millis(30_000),
            pool_max_idle_per_host: 50,
            pool_idle_timeout: Duration::from_secs(30),
        }
    }
}

/// Pooled reqwest-based transport.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Builds a transport with connection reuse and the configured deadlines.
    pub fn new(config: &TransportConfig) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .pool_idle_timeout(config.pool_idle_timeout)
            .build()
            .map_err(|e| transport_error(&e))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn post(&self, url: &str, body: String) -> Result<RawResponse, TransportError> {
        let response = self
            .client
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| transport_error(&e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| transport_error(&e))?;

        Ok(RawResponse {
            status_code: status.as_u16(),
            reason_phrase: status.canonical_reason().unwrap_or_default().to_string(),
            body,
        })
    }
}

/// Flattens a reqwest error and its source chain into one message.
fn transport_error(err: &reqwest::Error) -> TransportError {
    let mut message = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }

    TransportError {
        message,
        timed_out: err.is_timeout(),
    }
}
