//! System Board worker error types.

use system_board_core::error::DomainError;
use thiserror::Error;

/// Startup and runtime errors for the worker.
#[derive(Debug, Error)]
pub enum WorkerError {
    /// A required environment variable is missing or invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// Database connection or pool error.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// The bus connection could not be established.
    #[error("bus error: {0}")]
    Bus(String),

    /// The trace exporter could not be built.
    #[error("telemetry error: {0}")]
    Telemetry(String),

    /// The consumer loop failed.
    #[error("consumer error: {0}")]
    Consumer(#[from] DomainError),
}
