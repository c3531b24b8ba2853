//! Client for the downstream transaction processor.
//!
//! One attempt per request, no retry. A transport failure is timeout-class
//! when its cause reads as a timeout. An empty body or an invalid status line
//! counts as timeout-class too, while an undecodable body is a separate
//! decode failure.

pub mod client;
pub mod error;
pub mod memory;
pub mod transport;

pub use client::{DownstreamClient, RestDownstreamClient};
pub use error::{DownstreamError, Result, is_timeout_message};
pub use memory::{InMemoryDownstreamClient, ScriptedReply};
pub use transport::{HttpTransport, RawResponse, ReqwestTransport, TransportConfig, TransportError};
