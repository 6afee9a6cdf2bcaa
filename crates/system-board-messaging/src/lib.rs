//! Event propagation for the System Board backend.
//!
//! Producers route each event to a topic and wait for the broker to
//! acknowledge it ([`publisher::BusEventPublisher`]). Consumers wrap their
//! handlers in [`idempotency::IdempotentEventHandler`] so that at-least-once
//! delivery never applies an event twice; the
//! [`subscriber::EventStorePersistenceSubscriber`] is the consumer that copies
//! bus events into the event store.

pub mod codec;
pub mod idempotency;
pub mod nats;
pub mod publisher;
pub mod subscriber;
pub mod subscriptions;
pub mod topics;
