//! System Board Event Store: PostgreSQL adapters for the core ports.
//!
//! [`pg_event_store::PgEventStore`] keeps the authoritative event history;
//! [`pg_processed_event_ledger::PgProcessedEventLedger`] is the consumers'
//! idempotency ledger. Both share one connection pool and one migration set.

mod unique_violation;

pub mod pg_event_store;
pub mod pg_processed_event_ledger;
pub mod schema;
