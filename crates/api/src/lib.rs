//! HTTP API server for the transaction relay.
//!
//! Provides the relay and lookup endpoints, with structured logging
//! (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use downstream::DownstreamClient;
use metrics_exporter_prometheus::PrometheusHandle;
use record_store::RecordStore;
use relay::{ReconcilerConfig, ReconciliationWorker, RelayPipeline};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared application state accessible from all handlers.
pub struct AppState<S: RecordStore, D: DownstreamClient> {
    pub pipeline: RelayPipeline<S, D>,
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S, D>(state: Arc<AppState<S, D>>, metrics_handle: PrometheusHandle) -> Router
where
    S: RecordStore + 'static,
    D: DownstreamClient + 'static,
{
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check::<S, D>))
        .route(
            "/api/v1/transaction",
            post(routes::transactions::create::<S, D>),
        )
        .route(
            "/api/v1/transaction/{reference_number}",
            get(routes::transactions::get::<S, D>),
        )
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Wires the pipeline to `store` and `downstream` and starts the
/// reconciliation pool.
///
/// Must be called inside a tokio runtime. The returned worker must be shut
/// down once the server stops so queued outcomes are drained.
pub fn create_state<S, D>(
    store: S,
    downstream: D,
    reconciler: &ReconcilerConfig,
) -> (Arc<AppState<S, D>>, ReconciliationWorker)
where
    S: RecordStore + Clone + 'static,
    D: DownstreamClient,
{
    let worker = ReconciliationWorker::spawn(store.clone(), reconciler);
    let pipeline = RelayPipeline::new(store, downstream, worker.queue());

    (Arc::new(AppState { pipeline }), worker)
}
