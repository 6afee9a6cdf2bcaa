//! System Board: System Management bounded context.
//!
//! Registers the systems whose packages are tracked for vulnerabilities.
//! The `System` aggregate is event-sourced: registration publishes a
//! `SystemRegistered` event, and the aggregate is rebuilt from its
//! `System-{id}` stream.

pub mod application;
pub mod domain;
pub mod infrastructure;
