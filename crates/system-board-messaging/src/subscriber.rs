//! Bus consumer that persists every event into the event store.

use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use system_board_core::bus::BusMessage;
use system_board_core::clock::{Clock, SystemClock};
use system_board_core::error::DomainError;
use system_board_core::event::EventEnvelope;
use system_board_core::event_store::{EventStore, ExpectedVersion};
use system_board_core::ledger::ProcessedEventLedger;

use crate::codec::decode;
use crate::idempotency::{EventHandler, HandleOutcome, IdempotentEventHandler};

/// What the transport should do with a delivered message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Done; do not redeliver.
    Ack,
    /// Redeliver later.
    Nak,
    /// Never redeliver.
    Term,
}

/// Outcome of consuming one message.
#[derive(Debug)]
pub enum ConsumeResult {
    /// The event was appended to its stream.
    Persisted,
    /// The event had already been handled.
    Duplicate,
    /// No consumer is registered for the message's topic.
    Unrouted,
    /// Handling failed.
    Failed(DomainError),
    /// The message body is not an event envelope.
    Rejected(DomainError),
}

impl ConsumeResult {
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Persisted | Self::Duplicate | Self::Unrouted)
    }

    /// Maps the outcome onto a transport acknowledgment. Failures that would
    /// fail the same way on redelivery are terminated.
    #[must_use]
    pub fn disposition(&self) -> Disposition {
        match self {
            Self::Persisted | Self::Duplicate | Self::Unrouted => Disposition::Ack,
            Self::Failed(err) if err.is_retryable() => Disposition::Nak,
            Self::Failed(_) | Self::Rejected(_) => Disposition::Term,
        }
    }
}

/// Something that consumes raw bus messages.
#[async_trait]
pub trait MessageConsumer: Send + Sync {
    async fn consume(&self, message: &BusMessage) -> ConsumeResult;
}

/// Appends a single event at its own position in its stream.
///
/// The append expects the stream to hold exactly `aggregateVersion - 1`
/// events. On a conflict the stream is read back: if this very event already
/// sits at its position the append is treated as done, which covers a crash
/// between the append and the ledger mark.
#[derive(Debug)]
pub struct PersistToEventStore<S> {
    store: S,
}

impl<S: EventStore> PersistToEventStore<S> {
    #[must_use]
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    async fn already_at_position(&self, event: &EventEnvelope) -> Result<bool, DomainError> {
        let stream = self.store.read(&event.stream_name()).await?;
        let Some(index) = event
            .aggregate_version()
            .checked_sub(1)
            .and_then(|prior| usize::try_from(prior).ok())
        else {
            return Ok(false);
        };
        match stream.get(index) {
            Some(stored) if stored.event_id() == event.event_id() => Ok(true),
            Some(stored) => Err(DomainError::Validation(format!(
                "position {} of stream {} is held by event {}, not {}",
                event.aggregate_version(),
                event.stream_name(),
                stored.event_id(),
                event.event_id()
            ))),
            None => Ok(false),
        }
    }
}

#[async_trait]
impl<S: EventStore> EventHandler for PersistToEventStore<S> {
    async fn handle(&self, event: &EventEnvelope) -> Result<(), DomainError> {
        let stream_name = event.stream_name();
        let version = event.aggregate_version();
        if version < 1 {
            return Err(DomainError::Validation(format!(
                "event {} has aggregate version {version}, versions start at 1",
                event.event_id()
            )));
        }
        let expected = ExpectedVersion::from_prior(version - 1);

        match self
            .store
            .append(&stream_name, std::slice::from_ref(event), expected)
            .await
        {
            Ok(()) => Ok(()),
            Err(conflict @ DomainError::ConcurrencyConflict { .. }) => {
                if self.already_at_position(event).await? {
                    debug!(stream_name = %stream_name, "event already in its stream");
                    Ok(())
                } else {
                    Err(conflict)
                }
            }
            Err(err) => Err(err),
        }
    }
}

/// Copies bus events into the event store, at most once per event id.
#[derive(Debug)]
pub struct EventStorePersistenceSubscriber<S, L, C = SystemClock> {
    guard: IdempotentEventHandler<L, C>,
    persist: PersistToEventStore<S>,
}

impl<S: EventStore, L: ProcessedEventLedger> EventStorePersistenceSubscriber<S, L> {
    #[must_use]
    pub fn new(store: S, ledger: L) -> Self {
        Self::with_clock(store, ledger, SystemClock)
    }
}

impl<S: EventStore, L: ProcessedEventLedger, C: Clock> EventStorePersistenceSubscriber<S, L, C> {
    #[must_use]
    pub fn with_clock(store: S, ledger: L, clock: C) -> Self {
        Self {
            guard: IdempotentEventHandler::with_clock(ledger, clock),
            persist: PersistToEventStore::new(store),
        }
    }

    pub fn store(&self) -> &S {
        self.persist.store()
    }

    pub fn ledger(&self) -> &L {
        self.guard.ledger()
    }

    /// Persists one decoded event.
    pub async fn on_event(&self, event: &EventEnvelope) -> ConsumeResult {
        match self.guard.handle_with_idempotency(event, &self.persist).await {
            Ok(HandleOutcome::Processed) => {
                info!(
                    event_id = %event.event_id(),
                    event_type = event.event_type(),
                    stream_name = %event.stream_name(),
                    aggregate_version = event.aggregate_version(),
                    "event persisted to event store"
                );
                ConsumeResult::Persisted
            }
            Ok(HandleOutcome::Skipped) => ConsumeResult::Duplicate,
            Err(err) => {
                error!(
                    event_id = %event.event_id(),
                    event_type = event.event_type(),
                    error = %err,
                    "failed to persist event"
                );
                ConsumeResult::Failed(err)
            }
        }
    }
}

#[async_trait]
impl<S, L, C> MessageConsumer for EventStorePersistenceSubscriber<S, L, C>
where
    S: EventStore,
    L: ProcessedEventLedger,
    C: Clock,
{
    async fn consume(&self, message: &BusMessage) -> ConsumeResult {
        match decode(message) {
            Ok(event) => self.on_event(&event).await,
            Err(err) => {
                warn!(topic = %message.topic, key = %message.key, error = %err, "undecodable message");
                ConsumeResult::Rejected(err)
            }
        }
    }
}
