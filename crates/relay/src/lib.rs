//! Transaction relay pipeline.
//!
//! A request is validated, checked for duplicates, stored as `INITIALIZED`
//! and sent to the downstream processor once. Every outcome, including the
//! synthesized outcome of a failure, is handed to the reconciliation worker,
//! which writes the final status into the record off the request path.

pub mod error;
pub mod pipeline;
pub mod reconciler;
pub mod state;
pub mod validation;

pub use error::{ErrorKind, ErrorSignal, normalize_http_status};
pub use pipeline::RelayPipeline;
pub use reconciler::{
    ReconcilerConfig, ReconciliationQueue, ReconciliationStats, ReconciliationWorker,
};
pub use state::PipelineStage;
pub use validation::{FieldError, ValidationResult, validate};
