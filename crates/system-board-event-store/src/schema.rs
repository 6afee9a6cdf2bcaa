//! Event store database schema.

use sqlx::migrate::Migrator;

/// Embedded migrations creating `domain_events` and `processed_events`.
pub static MIGRATOR: Migrator = sqlx::migrate!("../../migrations");
