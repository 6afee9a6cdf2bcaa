//! Message bus abstraction.

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::error::DomainError;

/// Header carrying the event type tag.
pub const EVENT_TYPE_HEADER: &str = "event-type";

/// Header carrying the correlation id.
pub const CORRELATION_ID_HEADER: &str = "correlation-id";

/// Header carrying the body's media type.
pub const CONTENT_TYPE_HEADER: &str = "content-type";

/// An outbound or inbound bus message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusMessage {
    /// Message id the broker may use to drop duplicate sends.
    pub id: String,
    /// Destination topic.
    pub topic: String,
    /// Ordering/partition key; all messages with one key are delivered in
    /// order to a single consumer at a time.
    pub key: String,
    /// Transport headers, readable without decoding the body.
    pub headers: BTreeMap<String, String>,
    /// Serialized body.
    pub payload: Vec<u8>,
}

impl BusMessage {
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }
}

/// A durable message bus.
#[async_trait]
pub trait MessageBus: Send + Sync {
    /// Sends `message` and returns only once the broker has acknowledged
    /// durable receipt.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Transport` if the broker is unreachable, rejects
    /// the message, or the acknowledgment does not arrive.
    async fn send(&self, message: BusMessage) -> Result<(), DomainError>;
}
