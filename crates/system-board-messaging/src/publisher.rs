//! `EventPublisher` over a `MessageBus`.

use std::collections::BTreeMap;

use async_trait::async_trait;
use futures::future::join_all;
use tracing::{debug, warn};

use system_board_core::bus::MessageBus;
use system_board_core::error::DomainError;
use system_board_core::event::EventEnvelope;
use system_board_core::publisher::EventPublisher;

use crate::codec::encode;

/// Publishes events to their routed topic and waits for each broker
/// acknowledgment.
#[derive(Debug)]
pub struct BusEventPublisher<B> {
    bus: B,
}

impl<B: MessageBus> BusEventPublisher<B> {
    #[must_use]
    pub fn new(bus: B) -> Self {
        Self { bus }
    }

    /// Returns the underlying bus.
    pub fn bus(&self) -> &B {
        &self.bus
    }

    /// Sends one aggregate's events in order. After a failure the rest of
    /// the group is not sent, so the broker never holds a later version
    /// without the earlier one.
    async fn publish_in_order<'a>(
        &self,
        group: Vec<&'a EventEnvelope>,
    ) -> Vec<(&'a EventEnvelope, Result<(), DomainError>)> {
        let mut outcomes = Vec::with_capacity(group.len());
        let mut blocked = false;
        for event in group {
            let result = if blocked {
                Err(DomainError::Transport(format!(
                    "not sent: an earlier event of aggregate {} was not acknowledged",
                    event.aggregate_id()
                )))
            } else {
                self.publish(event).await
            };
            blocked |= result.is_err();
            outcomes.push((event, result));
        }
        outcomes
    }
}

#[async_trait]
impl<B: MessageBus> EventPublisher for BusEventPublisher<B> {
    async fn publish(&self, event: &EventEnvelope) -> Result<(), DomainError> {
        let message = encode(event)?;
        let topic = message.topic.clone();

        self.bus.send(message).await?;

        debug!(
            event_id = %event.event_id(),
            event_type = event.event_type(),
            aggregate_id = %event.aggregate_id(),
            correlation_id = %event.correlation_id(),
            topic = %topic,
            "event published"
        );
        Ok(())
    }

    async fn publish_all(&self, events: &[EventEnvelope]) -> Result<(), DomainError> {
        let mut group_of = BTreeMap::new();
        let mut groups: Vec<Vec<&EventEnvelope>> = Vec::new();
        for event in events {
            let index = *group_of.entry(event.aggregate_id()).or_insert_with(|| {
                groups.push(Vec::new());
                groups.len() - 1
            });
            groups[index].push(event);
        }

        let outcomes = join_all(groups.into_iter().map(|group| self.publish_in_order(group))).await;

        let mut published = Vec::new();
        let mut failed = Vec::new();
        let mut first_error = None;
        for (event, result) in outcomes.into_iter().flatten() {
            match result {
                Ok(()) => published.push(event.event_id()),
                Err(err) => {
                    failed.push((event.event_id(), err.to_string()));
                    first_error.get_or_insert(err);
                }
            }
        }

        match first_error {
            None => Ok(()),
            Some(err) if published.is_empty() => Err(err),
            Some(_) => {
                warn!(
                    published = published.len(),
                    failed = failed.len(),
                    "batch only partially acknowledged"
                );
                Err(DomainError::PartialPublish { published, failed })
            }
        }
    }
}
