//! Shared test doubles for the System Board backend.

mod bus;
mod clock;
mod ledger;
mod publisher;
mod store;

pub use bus::{FailingMessageBus, RecordingMessageBus};
pub use clock::FixedClock;
pub use ledger::{FailingLedger, InMemoryLedger};
pub use publisher::{FailingEventPublisher, RecordingEventPublisher};
pub use store::{FailingEventStore, InMemoryEventStore};
