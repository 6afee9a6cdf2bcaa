//! Application layer for the System Management context.

pub mod command_handlers;
pub mod query_handlers;
