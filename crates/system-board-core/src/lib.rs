//! System Board Core: shared event-sourcing abstractions.
//!
//! This crate defines the event and aggregate model plus the ports every
//! other crate plugs into: the event store, the processed-event ledger, the
//! message bus and the event publisher. It contains no infrastructure code.

pub mod aggregate;
pub mod bus;
pub mod clock;
pub mod command;
pub mod error;
pub mod event;
pub mod event_store;
pub mod ledger;
pub mod publisher;
