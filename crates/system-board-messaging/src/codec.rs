//! Envelope ⇄ bus message conversion.

use std::collections::BTreeMap;

use system_board_core::bus::{
    BusMessage, CONTENT_TYPE_HEADER, CORRELATION_ID_HEADER, EVENT_TYPE_HEADER,
};
use system_board_core::error::DomainError;
use system_board_core::event::EventEnvelope;

use crate::topics::topic_for;

/// Media type of every encoded body.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Builds the bus message for `envelope`: routed topic, the aggregate id as
/// key, the envelope as a JSON body.
///
/// # Errors
///
/// Returns `DomainError::Serialization` if the envelope cannot be encoded.
pub fn encode(envelope: &EventEnvelope) -> Result<BusMessage, DomainError> {
    let payload =
        serde_json::to_vec(envelope).map_err(|e| DomainError::Serialization(e.to_string()))?;

    let mut headers = BTreeMap::new();
    headers.insert(EVENT_TYPE_HEADER.to_owned(), envelope.event_type().to_owned());
    headers.insert(
        CORRELATION_ID_HEADER.to_owned(),
        envelope.correlation_id().to_string(),
    );
    headers.insert(CONTENT_TYPE_HEADER.to_owned(), JSON_CONTENT_TYPE.to_owned());

    Ok(BusMessage {
        id: envelope.event_id().to_string(),
        topic: topic_for(envelope.event_type()).to_owned(),
        key: envelope.aggregate_id().to_string(),
        headers,
        payload,
    })
}

/// Decodes a consumed message. A non-empty `event-type` header overrides the
/// body's `eventType`.
///
/// # Errors
///
/// Returns `DomainError::Serialization` if the body is not an envelope.
pub fn decode(message: &BusMessage) -> Result<EventEnvelope, DomainError> {
    let envelope: EventEnvelope = serde_json::from_slice(&message.payload)
        .map_err(|e| DomainError::Serialization(e.to_string()))?;

    match message.header(EVENT_TYPE_HEADER) {
        Some(event_type) if !event_type.is_empty() && event_type != envelope.event_type() => {
            Ok(envelope.with_event_type(event_type))
        }
        _ => Ok(envelope),
    }
}
