//! Health check endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use downstream::DownstreamClient;
use record_store::RecordStore;
use serde::Serialize;

use crate::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub reconciliation: ReconciliationHealth,
}

/// Reconciliation pool counters at the time of the check.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationHealth {
    pub queue_depth: usize,
    pub submitted: u64,
    pub rejected: u64,
    pub completed: u64,
    pub skipped: u64,
    pub failed: u64,
}

/// GET /health: returns system health status.
pub async fn check<S, D>(State(state): State<Arc<AppState<S, D>>>) -> Json<HealthResponse>
where
    S: RecordStore + 'static,
    D: DownstreamClient + 'static,
{
    let queue = state.pipeline.reconciler();
    let stats = queue.stats();
    Json(HealthResponse {
        status: "ok",
        reconciliation: ReconciliationHealth {
            queue_depth: queue.depth(),
            submitted: stats.submitted,
            rejected: stats.rejected,
            completed: stats.completed,
            skipped: stats.skipped,
            failed: stats.failed,
        },
    })
}
