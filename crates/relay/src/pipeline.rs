//! The relay pipeline: one synchronous pass per inbound request.

use std::time::Instant;

use common::{TransactionKey, TransactionOutcome, TransactionRequest, TransactionType};
use downstream::DownstreamClient;
use record_store::{RecordStore, TransactionRecord};

use crate::error::{ErrorKind, ErrorSignal};
use crate::reconciler::ReconciliationQueue;
use crate::state::PipelineStage;
use crate::validation::ValidationResult;

/// Relays transaction requests to the downstream processor.
///
/// Every request is stored as `INITIALIZED` before the processor is called,
/// and every outcome is handed to the reconciliation queue without waiting
/// for it to be written.
pub struct RelayPipeline<S, D>
where
    S: RecordStore,
    D: DownstreamClient,
{
    store: S,
    downstream: D,
    reconciler: ReconciliationQueue,
}

impl<S, D> RelayPipeline<S, D>
where
    S: RecordStore,
    D: DownstreamClient,
{
    /// Creates a new pipeline.
    pub fn new(store: S, downstream: D, reconciler: ReconciliationQueue) -> Self {
        Self {
            store,
            downstream,
            reconciler,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn reconciler(&self) -> &ReconciliationQueue {
        &self.reconciler
    }

    /// Runs one request through the pipeline.
    ///
    /// On success the processor's outcome is returned. On failure the
    /// classified signal is returned and, if a record may have been created,
    /// a matching failure outcome is submitted for reconciliation.
    #[tracing::instrument(
        skip(self, reference_number, request, validation, transaction_type),
        fields(reference_number = %reference_number, transaction_type = %transaction_type)
    )]
    pub async fn process(
        &self,
        reference_number: &str,
        request: &TransactionRequest,
        validation: &ValidationResult,
        transaction_type: TransactionType,
    ) -> Result<TransactionOutcome, ErrorSignal> {
        let started = Instant::now();
        let key = TransactionKey::new(reference_number, transaction_type);
        let mut stage = PipelineStage::default();

        let result = self.run(&key, request, validation, &mut stage).await;

        match &result {
            Ok(outcome) => {
                metrics::counter!("relay_requests_total", "result" => "success").increment(1);
                tracing::info!(
                    stage = %PipelineStage::Succeeded,
                    status = %outcome.status,
                    status_code = %outcome.status_code,
                    "transaction relayed"
                );
                self.reconciler.submit(outcome.clone());
            }
            Err(signal) => {
                metrics::counter!("relay_requests_total", "result" => signal.kind.as_str())
                    .increment(1);
                tracing::warn!(
                    stage = %PipelineStage::Failed,
                    failed_at = %stage,
                    kind = %signal.kind,
                    http_status = signal.http_status,
                    message = %signal.message,
                    "transaction failed"
                );

                // A duplicate at insert means the record belongs to another request.
                if stage.may_have_record() && signal.kind != ErrorKind::Duplicate {
                    self.reconciler.submit(signal.to_outcome(&key));
                } else {
                    tracing::debug!(failed_at = %stage, "no record created; reconciliation skipped");
                }
            }
        }

        metrics::histogram!("relay_duration_seconds").record(started.elapsed().as_secs_f64());
        result
    }

    async fn run(
        &self,
        key: &TransactionKey,
        request: &TransactionRequest,
        validation: &ValidationResult,
        stage: &mut PipelineStage,
    ) -> Result<TransactionOutcome, ErrorSignal> {
        if let Some(error) = validation.first() {
            return Err(ErrorSignal::field_validation(error));
        }
        let amount =
            TransactionRecord::parse_amount(&request.amount).map_err(ErrorSignal::field_validation)?;

        *stage = PipelineStage::DuplicateCheck;
        if self.store.exists(key).await? {
            return Err(ErrorSignal::duplicate());
        }

        *stage = PipelineStage::PersistingInitial;
        let record = TransactionRecord::builder()
            .reference_number(key.reference_number.clone())
            .transaction_type(key.transaction_type)
            .sender_name(request.sender_name.clone())
            .receiver_name(request.receiver_name.clone())
            .amount(amount)
            .currency(request.currency.clone())
            .channel_id(request.channel_id.clone())
            .build();
        let record_id = record.id;
        self.store.insert(record).await?;
        tracing::info!(%record_id, "record stored as INITIALIZED");

        *stage = PipelineStage::CallingDownstream;
        let outcome = self.downstream.send(request, key.transaction_type).await?;
        Ok(outcome)
    }

    /// Fetches the stored record for `key`.
    #[tracing::instrument(skip(self, key), fields(key = %key))]
    pub async fn lookup(
        &self,
        key: &TransactionKey,
    ) -> Result<Option<TransactionRecord>, ErrorSignal> {
        Ok(self.store.fetch(key).await?)
    }
}
