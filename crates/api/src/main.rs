//! API server entry point.

use api::config::{Config, LogFormat};
use downstream::{
    DownstreamClient, InMemoryDownstreamClient, ReqwestTransport, RestDownstreamClient,
};
use metrics_exporter_prometheus::PrometheusHandle;
use record_store::{InMemoryRecordStore, PostgresRecordStore, RecordStore};
use sqlx::postgres::PgPoolOptions;
use tokio::signal;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        }
    }
}

fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    let registry = tracing_subscriber::registry().with(filter);

    match config.log_format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

#[tokio::main]
async fn main() {
    // 1. Load configuration and initialize tracing
    let config = Config::from_env();
    init_tracing(&config);

    // 2. Install Prometheus metrics recorder
    let metrics_handle = metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    // 3. Choose the record store
    match config.database_url.clone() {
        Some(url) => {
            let pool = PgPoolOptions::new()
                .max_connections(config.database_max_connections)
                .connect(&url)
                .await
                .expect("failed to connect to database");
            let store = PostgresRecordStore::new(pool);
            store
                .run_migrations()
                .await
                .expect("failed to run migrations");
            tracing::info!("using PostgreSQL record store");
            with_store(config, store, metrics_handle).await;
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using in-memory record store");
            with_store(config, InMemoryRecordStore::new(), metrics_handle).await;
        }
    }
}

/// Chooses the downstream client and runs the server.
async fn with_store<S>(config: Config, store: S, metrics_handle: PrometheusHandle)
where
    S: RecordStore + Clone + 'static,
{
    match config.downstream_url.clone() {
        Some(url) => {
            let transport =
                ReqwestTransport::new(&config.transport).expect("failed to build HTTP client");
            tracing::info!(%url, "relaying to downstream processor");
            let downstream = RestDownstreamClient::new(url, transport);
            serve(config, store, downstream, metrics_handle).await;
        }
        None => {
            tracing::warn!("DOWNSTREAM_URL not set, using in-memory processor");
            serve(config, store, InMemoryDownstreamClient::new(), metrics_handle).await;
        }
    }
}

async fn serve<S, D>(config: Config, store: S, downstream: D, metrics_handle: PrometheusHandle)
where
    S: RecordStore + Clone + 'static,
    D: DownstreamClient + 'static,
{
    // 4. Build the application
    let (state, worker) = api::create_state(store, downstream, &config.reconciler);
    let app = api::create_app(state, metrics_handle);

    // 5. Start server
    let addr = config.addr();
    tracing::info!(%addr, "starting API server");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind address");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    // 6. Drain outstanding reconciliation work
    worker.shutdown().await;
    tracing::info!("server shut down gracefully");
}
