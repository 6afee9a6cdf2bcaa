//! Topic → consumer registrations, made once at startup.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{info, warn};

use system_board_core::bus::BusMessage;

use crate::subscriber::{ConsumeResult, MessageConsumer};

/// Which consumer handles which topic.
#[derive(Default)]
pub struct Subscriptions {
    consumers: BTreeMap<String, Arc<dyn MessageConsumer>>,
}

impl Subscriptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Routes `topic` to `consumer`, replacing any earlier registration.
    pub fn subscribe(&mut self, topic: impl Into<String>, consumer: Arc<dyn MessageConsumer>) {
        let topic = topic.into();
        info!(topic = %topic, "consumer registered");
        self.consumers.insert(topic, consumer);
    }

    /// Registered topics, sorted.
    pub fn topics(&self) -> impl Iterator<Item = &str> {
        self.consumers.keys().map(String::as_str)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.consumers.is_empty()
    }

    /// Hands `message` to the consumer registered for its topic.
    pub async fn dispatch(&self, message: &BusMessage) -> ConsumeResult {
        match self.consumers.get(&message.topic) {
            Some(consumer) => consumer.consume(message).await,
            None => {
                warn!(topic = %message.topic, "no consumer registered for topic");
                ConsumeResult::Unrouted
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;

    #[derive(Default)]
    struct Counting {
        seen: AtomicUsize,
    }

    #[async_trait]
    impl MessageConsumer for Counting {
        async fn consume(&self, _message: &BusMessage) -> ConsumeResult {
            self.seen.fetch_add(1, Ordering::SeqCst);
            ConsumeResult::Persisted
        }
    }

    fn message(topic: &str) -> BusMessage {
        BusMessage {
            id: "m-1".into(),
            topic: topic.into(),
            key: "k".into(),
            headers: BTreeMap::new(),
            payload: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_dispatch_reaches_registered_consumer_only() {
        // Arrange
        let system = Arc::new(Counting::default());
        let tasks = Arc::new(Counting::default());
        let mut subscriptions = Subscriptions::new();
        subscriptions.subscribe("system-events", system.clone());
        subscriptions.subscribe("task-events", tasks.clone());

        // Act
        let result = subscriptions.dispatch(&message("system-events")).await;

        // Assert
        assert!(matches!(result, ConsumeResult::Persisted));
        assert_eq!(system.seen.load(Ordering::SeqCst), 1);
        assert_eq!(tasks.seen.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unregistered_topic_is_unrouted() {
        let subscriptions = Subscriptions::new();

        let result = subscriptions.dispatch(&message("urgent-events")).await;

        assert!(matches!(result, ConsumeResult::Unrouted));
    }

    #[test]
    fn test_topics_are_listed_sorted() {
        let consumer: Arc<dyn MessageConsumer> = Arc::new(Counting::default());
        let mut subscriptions = Subscriptions::new();
        subscriptions.subscribe("task-events", consumer.clone());
        subscriptions.subscribe("domain-events", consumer);

        let topics: Vec<&str> = subscriptions.topics().collect();

        assert_eq!(topics, vec!["domain-events", "task-events"]);
    }
}
