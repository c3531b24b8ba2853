//! Bounded worker pool that writes final outcomes into stored records.
//!
//! Submission never blocks: when the queue is full, or the pool is shutting
//! down, the outcome is logged and dropped. Shutdown closes the channel, so
//! every accepted outcome is either processed or still queued when the grace
//! period runs out. A unit that fails to update its
//! record is logged and dropped too, leaving the record `INITIALIZED`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use common::TransactionOutcome;
use record_store::RecordStore;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;

/// Sizing of the reconciliation pool.
#[derive(Debug, Clone)]
pub struct ReconcilerConfig {
    /// Number of parallel workers (at least one is spawned).
    pub workers: usize,
    /// Capacity of the bounded queue (at least one).
    pub queue_capacity: usize,
    /// How long shutdown waits for queued work to drain.
    pub shutdown_grace: Duration,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            workers: 8,
            queue_capacity: 10_000,
            shutdown_grace: Duration::from_secs(60),
        }
    }
}

#[derive(Debug, Default)]
struct Counters {
    submitted: AtomicU64,
    rejected: AtomicU64,
    completed: AtomicU64,
    skipped: AtomicU64,
    failed: AtomicU64,
}

/// Point-in-time snapshot of reconciliation counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconciliationStats {
    pub submitted: u64,
    pub rejected: u64,
    pub completed: u64,
    pub skipped: u64,
    pub failed: u64,
}

impl ReconciliationStats {
    /// Units taken off the queue and finished, whatever their result.
    pub fn processed(&self) -> u64 {
        self.completed + self.skipped + self.failed
    }
}

/// Cloneable handle used to submit outcomes to the pool.
///
/// All clones share one sender. Shutdown takes it, which closes the channel.
#[derive(Debug, Clone)]
pub struct ReconciliationQueue {
    sender: Arc<RwLock<Option<mpsc::Sender<TransactionOutcome>>>>,
    counters: Arc<Counters>,
}

impl ReconciliationQueue {
    /// Enqueues an outcome without waiting.
    ///
    /// Returns false if the outcome was rejected.
    pub fn submit(&self, outcome: TransactionOutcome) -> bool {
        // Held across try_send so shutdown cannot close the channel in between.
        let guard = self.sender.read().unwrap_or_else(PoisonError::into_inner);
        let Some(sender) = guard.as_ref() else {
            self.reject(&outcome, "reconciliation pool is shutting down");
            return false;
        };

        match sender.try_send(outcome) {
            Ok(()) => {
                self.counters.submitted.fetch_add(1, Ordering::Relaxed);
                metrics::counter!("reconciliation_submitted_total").increment(1);
                metrics::gauge!("reconciliation_queue_depth").set(self.depth() as f64);
                true
            }
            Err(TrySendError::Full(outcome)) => {
                self.reject(&outcome, "reconciliation queue is full");
                false
            }
            Err(TrySendError::Closed(outcome)) => {
                self.reject(&outcome, "reconciliation pool has stopped");
                false
            }
        }
    }

    /// Number of accepted outcomes not yet processed.
    pub fn depth(&self) -> usize {
        let stats = self.stats();
        stats.submitted.saturating_sub(stats.processed()) as usize
    }

    /// Drops the shared sender. Returns false if it was already closed.
    fn close(&self) -> bool {
        self.sender
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .is_some()
    }

    /// Returns a snapshot of the counters.
    pub fn stats(&self) -> ReconciliationStats {
        ReconciliationStats {
            submitted: self.counters.submitted.load(Ordering::Relaxed),
            rejected: self.counters.rejected.load(Ordering::Relaxed),
            completed: self.counters.completed.load(Ordering::Relaxed),
            skipped: self.counters.skipped.load(Ordering::Relaxed),
            failed: self.counters.failed.load(Ordering::Relaxed),
        }
    }

    fn reject(&self, outcome: &TransactionOutcome, reason: &str) {
        self.counters.rejected.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("reconciliation_rejected_total").increment(1);
        tracing::warn!(
            reference_number = %outcome.reference_number,
            transaction_type = %outcome.transaction_type,
            status = %outcome.status,
            reason,
            "reconciliation unit rejected"
        );
    }
}

/// Owner of the worker tasks.
pub struct ReconciliationWorker {
    queue: ReconciliationQueue,
    handles: Vec<JoinHandle<()>>,
    grace: Duration,
}

impl ReconciliationWorker {
    /// Spawns the workers on the current tokio runtime.
    pub fn spawn<S>(store: S, config: &ReconcilerConfig) -> Self
    where
        S: RecordStore + Clone + 'static,
    {
        let (sender, receiver) = mpsc::channel(config.queue_capacity.max(1));
        let counters = Arc::new(Counters::default());
        let receiver = Arc::new(Mutex::new(receiver));

        let queue = ReconciliationQueue {
            sender: Arc::new(RwLock::new(Some(sender))),
            counters,
        };

        let handles = (0..config.workers.max(1))
            .map(|worker_id| {
                tokio::spawn(run_worker(
                    worker_id,
                    store.clone(),
                    queue.clone(),
                    receiver.clone(),
                ))
            })
            .collect();

        tracing::info!(
            workers = config.workers.max(1),
            queue_capacity = config.queue_capacity.max(1),
            "reconciliation pool started"
        );

        Self {
            queue,
            handles,
            grace: config.shutdown_grace,
        }
    }

    /// Returns a handle for submitting outcomes.
    pub fn queue(&self) -> ReconciliationQueue {
        self.queue.clone()
    }

    /// Stops accepting work and waits up to the grace period for queued
    /// outcomes to drain. Workers still busy after that are aborted.
    pub async fn shutdown(self) -> ReconciliationStats {
        if !self.queue.close() {
            tracing::debug!("reconciliation queue already closed");
        }
        tracing::info!(pending = self.queue.depth(), "draining reconciliation pool");

        let aborts: Vec<_> = self.handles.iter().map(JoinHandle::abort_handle).collect();
        let drained =
            tokio::time::timeout(self.grace, futures_util::future::join_all(self.handles)).await;

        if drained.is_err() {
            tracing::warn!(
                pending = self.queue.depth(),
                grace_secs = self.grace.as_secs(),
                "reconciliation pool did not drain in time; aborting workers"
            );
            for abort in aborts {
                abort.abort();
            }
        }

        let stats = self.queue.stats();
        tracing::info!(
            completed = stats.completed,
            skipped = stats.skipped,
            failed = stats.failed,
            rejected = stats.rejected,
            "reconciliation pool stopped"
        );
        stats
    }
}

/// Takes units until the channel is closed and empty.
async fn run_worker<S: RecordStore>(
    worker_id: usize,
    store: S,
    queue: ReconciliationQueue,
    receiver: Arc<Mutex<mpsc::Receiver<TransactionOutcome>>>,
) {
    loop {
        let next = receiver.lock().await.recv().await;
        let Some(outcome) = next else {
            break;
        };
        reconcile(&store, &outcome, &queue.counters).await;
        metrics::gauge!("reconciliation_queue_depth").set(queue.depth() as f64);
    }
    tracing::debug!(worker_id, "reconciliation worker exited");
}

/// Copies the outcome onto the stored record.
#[tracing::instrument(
    skip(store, outcome, counters),
    fields(
        reference_number = %outcome.reference_number,
        transaction_type = %outcome.transaction_type,
        status = %outcome.status
    )
)]
async fn reconcile<S: RecordStore>(store: &S, outcome: &TransactionOutcome, counters: &Counters) {
    let key = outcome.key();

    let mut record = match store.fetch(&key).await {
        Ok(Some(record)) => record,
        Ok(None) => {
            counters.skipped.fetch_add(1, Ordering::Relaxed);
            metrics::counter!("reconciliation_skipped_total").increment(1);
            tracing::warn!("no stored record for outcome; nothing to reconcile");
            return;
        }
        Err(e) => {
            counters.failed.fetch_add(1, Ordering::Relaxed);
            metrics::counter!("reconciliation_failed_total").increment(1);
            tracing::error!(error = %e, "failed to load record for reconciliation");
            return;
        }
    };

    record.apply_outcome(outcome);
    match store.update(&record).await {
        Ok(()) => {
            counters.completed.fetch_add(1, Ordering::Relaxed);
            metrics::counter!("reconciliation_completed_total").increment(1);
            tracing::info!(status_code = %record.status_code, "record reconciled");
        }
        Err(e) => {
            counters.failed.fetch_add(1, Ordering::Relaxed);
            metrics::counter!("reconciliation_failed_total").increment(1);
            tracing::error!(error = %e, "failed to update record; left at INITIALIZED");
        }
    }
}
