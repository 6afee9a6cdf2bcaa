//! Infrastructure adapters for the System Management context.

pub mod event_sourcing_repository;
