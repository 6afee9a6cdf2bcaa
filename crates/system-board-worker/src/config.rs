//! Worker configuration, read from environment variables.

use crate::error::WorkerError;

const DEFAULT_NATS_URL: &str = "nats://127.0.0.1:4222";
const DEFAULT_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_STREAM_NAME: &str = "DOMAIN_EVENTS";
const DEFAULT_CONSUMER_NAME: &str = "event-store-persistence";

/// Settings the worker needs at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerConfig {
    pub database_url: String,
    pub database_max_connections: u32,
    pub nats_url: String,
    pub bus_stream_name: String,
    pub consumer_name: String,
    /// OTLP collector endpoint; spans are only exported when set.
    pub otlp_endpoint: Option<String>,
}

impl WorkerConfig {
    /// Reads the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `WorkerError::Config` if `DATABASE_URL` is missing or a value
    /// does not parse.
    pub fn from_env() -> Result<Self, WorkerError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads the configuration through `lookup`, which returns a variable's
    /// value or `None` when it is unset.
    ///
    /// # Errors
    ///
    /// Same as [`WorkerConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, WorkerError> {
        let database_url = lookup("DATABASE_URL").ok_or_else(|| {
            WorkerError::Config("DATABASE_URL environment variable must be set".into())
        })?;

        let database_max_connections = match lookup("DATABASE_MAX_CONNECTIONS") {
            Some(value) => value.parse().map_err(|e| {
                WorkerError::Config(format!("DATABASE_MAX_CONNECTIONS must be a valid u32: {e}"))
            })?,
            None => DEFAULT_MAX_CONNECTIONS,
        };
        if database_max_connections == 0 {
            return Err(WorkerError::Config(
                "DATABASE_MAX_CONNECTIONS must be at least 1".into(),
            ));
        }

        Ok(Self {
            database_url,
            database_max_connections,
            nats_url: lookup("NATS_URL").unwrap_or_else(|| DEFAULT_NATS_URL.to_string()),
            bus_stream_name: lookup("BUS_STREAM_NAME")
                .unwrap_or_else(|| DEFAULT_STREAM_NAME.to_string()),
            consumer_name: lookup("CONSUMER_NAME")
                .unwrap_or_else(|| DEFAULT_CONSUMER_NAME.to_string()),
            otlp_endpoint: lookup("OTEL_EXPORTER_OTLP_ENDPOINT").filter(|v| !v.trim().is_empty()),
        })
    }
}
