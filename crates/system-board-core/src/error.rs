//! Domain error types.

use thiserror::Error;
use uuid::Uuid;

/// Top-level domain error type.
#[derive(Debug, Error)]
pub enum DomainError {
    /// An aggregate was not found.
    #[error("aggregate not found: {0}")]
    AggregateNotFound(Uuid),

    /// Optimistic concurrency conflict on an event stream append.
    #[error("concurrency conflict on stream {stream_name}: expected version {expected}, found {actual}")]
    ConcurrencyConflict {
        /// The stream that had the conflict.
        stream_name: String,
        /// The stream length the writer expected.
        expected: i64,
        /// The stream length actually found.
        actual: i64,
    },

    /// A validation error in domain logic.
    #[error("validation error: {0}")]
    Validation(String),

    /// The bus or the store was unreachable, timed out, or rejected the call.
    #[error("transport error: {0}")]
    Transport(String),

    /// An event could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// A stored stream has a gap or a reordering in its aggregate versions.
    #[error("corrupt stream {stream_name}: expected aggregate version {expected}, found {found}")]
    CorruptStream {
        /// The stream being replayed.
        stream_name: String,
        /// The version the replay expected next.
        expected: i64,
        /// The version carried by the stored event.
        found: i64,
    },

    /// A handler wrapped by the idempotency layer failed. The event stays
    /// unprocessed so the bus redelivers it.
    #[error("handler failed for event {event_id}: {source}")]
    HandlerFailure {
        /// The event being handled.
        event_id: Uuid,
        /// What the handler returned.
        #[source]
        source: Box<DomainError>,
    },

    /// Some events of a batch were acknowledged by the bus and some were not.
    #[error("partial publish: {} event(s) acknowledged, {} failed", published.len(), failed.len())]
    PartialPublish {
        /// Events the broker acknowledged.
        published: Vec<Uuid>,
        /// Events that failed, with the failure message.
        failed: Vec<(Uuid, String)>,
    },
}

impl DomainError {
    /// Returns `true` for failures a caller may retry as-is (bus redelivery,
    /// transport backoff). Validation and serialization failures will fail the
    /// same way again.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::ConcurrencyConflict { .. }
            | Self::Transport(_)
            | Self::PartialPublish { .. } => true,
            Self::HandlerFailure { source, .. } => source.is_retryable(),
            Self::AggregateNotFound(_)
            | Self::Validation(_)
            | Self::Serialization(_)
            | Self::CorruptStream { .. } => false,
        }
    }
}
