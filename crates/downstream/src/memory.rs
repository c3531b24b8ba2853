//! Scriptable in-memory downstream client.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use common::{TransactionOutcome, TransactionRequest, TransactionStatus, TransactionType};

use crate::client::DownstreamClient;
use crate::error::{DownstreamError, Result};

/// A reply the in-memory processor produces for one call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptedReply {
    /// `SUCCESS` / `00` / `Approved`.
    Approve,
    /// A decoded reply with explicit fields.
    Respond {
        status: TransactionStatus,
        status_code: String,
        status_desc: String,
    },
    /// A transport failure with the given message; classified by the timeout
    /// predicate.
    TransportFailure(String),
    /// An empty body.
    NoResponse,
    /// A body that cannot be decoded.
    Undecodable(String),
}

#[derive(Debug)]
struct InMemoryDownstreamState {
    script: VecDeque<ScriptedReply>,
    default_reply: ScriptedReply,
    sent: Vec<TransactionRequest>,
    next_id: u32,
    latency: Duration,
}

impl Default for InMemoryDownstreamState {
    fn default() -> Self {
        Self {
            script: VecDeque::new(),
            default_reply: ScriptedReply::Approve,
            sent: Vec::new(),
            next_id: 0,
            latency: Duration::ZERO,
        }
    }
}

/// In-memory downstream processor for testing and local runs.
///
/// Replies are taken from the script in order; once it is exhausted every
/// call gets the default reply (approve, unless changed).
#[derive(Debug, Clone, Default)]
pub struct InMemoryDownstreamClient {
    state: Arc<Mutex<InMemoryDownstreamState>>,
}

impl InMemoryDownstreamClient {
    /// Creates a processor that approves everything.
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, InMemoryDownstreamState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queues a reply for the next unscripted call.
    pub fn push_reply(&self, reply: ScriptedReply) {
        self.state().script.push_back(reply);
    }

    /// Sets the reply used once the script is exhausted.
    pub fn set_default_reply(&self, reply: ScriptedReply) {
        self.state().default_reply = reply;
    }

    /// Delays every call by `latency` before replying.
    pub fn set_latency(&self, latency: Duration) {
        self.state().latency = latency;
    }

    /// Returns the number of calls received.
    pub fn call_count(&self) -> usize {
        self.state().sent.len()
    }

    /// Returns the requests received, in call order.
    pub fn sent_requests(&self) -> Vec<TransactionRequest> {
        self.state().sent.clone()
    }
}

#[async_trait]
impl DownstreamClient for InMemoryDownstreamClient {
    async fn send(
        &self,
        request: &TransactionRequest,
        transaction_type: TransactionType,
    ) -> Result<TransactionOutcome> {
        let (reply, latency, tran_id) = {
            let mut state = self.state();
            state.sent.push(request.clone());
            let reply = state
                .script
                .pop_front()
                .unwrap_or_else(|| state.default_reply.clone());
            state.next_id += 1;
            (reply, state.latency, format!("DS-{:04}", state.next_id))
        };

        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        let (status, status_code, status_desc) = match reply {
            ScriptedReply::Approve => (
                TransactionStatus::Success,
                "00".to_string(),
                "Approved".to_string(),
            ),
            ScriptedReply::Respond { status, .. } if !status.is_final() => {
                return Err(DownstreamError::ResponseDecode(format!(
                    "processor returned non-final status {status}"
                )));
            }
            ScriptedReply::Respond {
                status,
                status_code,
                status_desc,
            } => (status, status_code, status_desc),
            ScriptedReply::TransportFailure(message) => {
                return Err(DownstreamError::transport(message, false));
            }
            ScriptedReply::NoResponse => {
                return Err(DownstreamError::NoResponse { status_code: 200 });
            }
            ScriptedReply::Undecodable(message) => {
                return Err(DownstreamError::ResponseDecode(message));
            }
        };

        Ok(TransactionOutcome {
            reference_number: request.reference_number.clone(),
            transaction_type,
            status,
            status_code,
            status_desc,
            downstream_transaction_id: Some(tran_id),
        })
    }
}
