//! Idempotent event handling over a processed-event ledger.
//!
//! The ledger check and the ledger insert are two separate calls with the
//! handler in between, and no lock spans them. Two deliveries of the same
//! event racing through [`IdempotentEventHandler::handle_with_idempotency`]
//! can both run the handler; only one ledger row results. Handlers must
//! therefore be idempotent in their effects, not just guarded by the ledger.

use async_trait::async_trait;
use tracing::{debug, error};

use system_board_core::clock::{Clock, SystemClock};
use system_board_core::error::DomainError;
use system_board_core::event::EventEnvelope;
use system_board_core::ledger::ProcessedEventLedger;

/// A side-effecting reaction to one event.
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Applies the event's effect.
    ///
    /// # Errors
    ///
    /// Any error leaves the event unprocessed so that it is redelivered.
    async fn handle(&self, event: &EventEnvelope) -> Result<(), DomainError>;
}

/// What happened to an event passed through the idempotency guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleOutcome {
    /// The handler ran and the event is now in the ledger.
    Processed,
    /// The ledger already had the event; the handler did not run.
    Skipped,
}

/// Wraps handlers with "skip if processed, mark after success".
#[derive(Debug)]
pub struct IdempotentEventHandler<L, C = SystemClock> {
    ledger: L,
    clock: C,
}

impl<L: ProcessedEventLedger> IdempotentEventHandler<L> {
    #[must_use]
    pub fn new(ledger: L) -> Self {
        Self::with_clock(ledger, SystemClock)
    }
}

impl<L: ProcessedEventLedger, C: Clock> IdempotentEventHandler<L, C> {
    /// Uses `clock` for the ledger's `processedAt` timestamps.
    #[must_use]
    pub fn with_clock(ledger: L, clock: C) -> Self {
        Self { ledger, clock }
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Runs `handler` for `event` unless the ledger says it already ran.
    ///
    /// # Errors
    ///
    /// - `DomainError::HandlerFailure` wrapping the handler's error. The
    ///   event is not marked.
    /// - `DomainError::Transport` if the ledger cannot be read or written.
    #[tracing::instrument(
        skip(self, event, handler),
        fields(event_id = %event.event_id(), event_type = event.event_type())
    )]
    pub async fn handle_with_idempotency<H>(
        &self,
        event: &EventEnvelope,
        handler: &H,
    ) -> Result<HandleOutcome, DomainError>
    where
        H: EventHandler + ?Sized,
    {
        if self.ledger.is_processed(event.event_id()).await? {
            debug!("event already processed, skipping");
            return Ok(HandleOutcome::Skipped);
        }

        if let Err(err) = handler.handle(event).await {
            error!(error = %err, "event handler failed");
            return Err(DomainError::HandlerFailure {
                event_id: event.event_id(),
                source: Box::new(err),
            });
        }

        self.ledger
            .mark_as_processed(event.event_id(), event.event_type(), self.clock.now())
            .await?;

        debug!("event processed");
        Ok(HandleOutcome::Processed)
    }
}
