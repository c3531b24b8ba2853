//! Stages of one pass through the relay pipeline.

/// The stage a request is in.
///
/// Stage transitions:
/// ```text
/// Validating ──► DuplicateCheck ──► PersistingInitial ──► CallingDownstream ──► Succeeded
///      │               │                    │                      │
///      └───────────────┴────────────────────┴──────────────────────┴──────────► Failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum PipelineStage {
    #[default]
    Validating,
    DuplicateCheck,
    PersistingInitial,
    CallingDownstream,
    /// The processor answered and the reply was decoded (terminal state).
    Succeeded,
    /// An earlier stage raised an error (terminal state).
    Failed,
}

impl PipelineStage {
    /// Returns true if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineStage::Succeeded | PipelineStage::Failed)
    }

    /// Returns true if a record may exist for a failure raised in this stage.
    ///
    /// Failures at or before the duplicate check never created a record, so
    /// there is nothing to reconcile.
    pub fn may_have_record(&self) -> bool {
        matches!(
            self,
            PipelineStage::PersistingInitial | PipelineStage::CallingDownstream
        )
    }

    /// Returns the stage name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStage::Validating => "VALIDATING",
            PipelineStage::DuplicateCheck => "DUPLICATE_CHECK",
            PipelineStage::PersistingInitial => "PERSISTING_INITIAL",
            PipelineStage::CallingDownstream => "CALLING_DOWNSTREAM",
            PipelineStage::Succeeded => "SUCCEEDED",
            PipelineStage::Failed => "FAILED",
        }
    }
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
