//! Application configuration loaded from environment variables.

use std::str::FromStr;
use std::time::Duration;

use downstream::TransportConfig;
use relay::ReconcilerConfig;

/// Output format of the log layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "pretty" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format: {other}")),
        }
    }
}

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST`, `PORT`: bind address (default `0.0.0.0:3000`)
/// - `RUST_LOG`: tracing filter directive (default `info`)
/// - `LOG_FORMAT`: `text` or `json`
/// - `DATABASE_URL`, `DATABASE_MAX_CONNECTIONS`: Postgres store; the
///   in-memory store is used when no URL is set
/// - `DOWNSTREAM_URL`: processor endpoint; an in-memory processor that
///   approves everything is used when unset
/// - `DOWNSTREAM_CONNECT_TIMEOUT_MS`, `DOWNSTREAM_TIMEOUT_MS`,
///   `DOWNSTREAM_POOL_MAX_IDLE_PER_HOST`
/// - `RECONCILER_WORKERS`, `RECONCILER_QUEUE_CAPACITY`, `SHUTDOWN_GRACE_SECS`
///
/// Values that fail to parse fall back to the default.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub log_format: LogFormat,
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub downstream_url: Option<String>,
    pub transport: TransportConfig,
    pub reconciler: ReconcilerConfig,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Loads configuration through `lookup`, which maps a variable name to
    /// its value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let text = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let parsed = |name: &str| text(name).and_then(|v| v.trim().parse::<u64>().ok());

        let transport = TransportConfig {
            connect_timeout: parsed("DOWNSTREAM_CONNECT_TIMEOUT_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.transport.connect_timeout),
            request_timeout: parsed("DOWNSTREAM_TIMEOUT_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.transport.request_timeout),
            pool_max_idle_per_host: parsed("DOWNSTREAM_POOL_MAX_IDLE_PER_HOST")
                .map(|n| n as usize)
                .unwrap_or(defaults.transport.pool_max_idle_per_host),
            ..defaults.transport
        };

        let reconciler = ReconcilerConfig {
            workers: parsed("RECONCILER_WORKERS")
                .filter(|n| *n > 0)
                .map(|n| n as usize)
                .unwrap_or(defaults.reconciler.workers),
            queue_capacity: parsed("RECONCILER_QUEUE_CAPACITY")
                .filter(|n| *n > 0)
                .map(|n| n as usize)
                .unwrap_or(defaults.reconciler.queue_capacity),
            shutdown_grace: parsed("SHUTDOWN_GRACE_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.reconciler.shutdown_grace),
        };

        Self {
            host: text("HOST").unwrap_or(defaults.host),
            port: text("PORT")
                .and_then(|p| p.trim().parse().ok())
                .unwrap_or(defaults.port),
            log_level: text("RUST_LOG").unwrap_or(defaults.log_level),
            log_format: text("LOG_FORMAT")
                .and_then(|f| f.parse().ok())
                .unwrap_or(defaults.log_format),
            database_url: text("DATABASE_URL"),
            database_max_connections: text("DATABASE_MAX_CONNECTIONS")
                .and_then(|n| n.trim().parse().ok())
                .unwrap_or(defaults.database_max_connections),
            downstream_url: text("DOWNSTREAM_URL"),
            transport,
            reconciler,
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
            database_url: None,
            database_max_connections: 10,
            downstream_url: None,
            transport: TransportConfig::default(),
            reconciler: ReconcilerConfig::default(),
        }
    }
}
