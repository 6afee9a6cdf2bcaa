//! NATS `JetStream` transport: the bus adapter and the consumer loop.
//!
//! Each topic maps to the subject space `{topic}.>`; a message for aggregate
//! `a` on topic `t` is published to `t.a`, so per-aggregate order follows
//! per-subject order in the stream.

use std::collections::BTreeMap;
use std::future::Future;

use async_nats::jetstream::{self, AckKind, consumer::AckPolicy, consumer::pull};
use async_nats::{HeaderMap, header::NATS_MESSAGE_ID};
use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use tracing::{debug, info, warn};

use system_board_core::bus::{
    BusMessage, CONTENT_TYPE_HEADER, CORRELATION_ID_HEADER, EVENT_TYPE_HEADER, MessageBus,
};
use system_board_core::error::DomainError;

use crate::subscriber::Disposition;
use crate::subscriptions::Subscriptions;

const FORWARDED_HEADERS: [&str; 3] = [EVENT_TYPE_HEADER, CORRELATION_ID_HEADER, CONTENT_TYPE_HEADER];

fn transport(err: impl std::fmt::Display) -> DomainError {
    DomainError::Transport(err.to_string())
}

/// Subject a message is published to.
#[must_use]
pub fn subject_for(message: &BusMessage) -> String {
    format!("{}.{}", message.topic, message.key)
}

/// Stream/consumer filter covering every subject of `topics`.
#[must_use]
pub fn subject_filters<'a>(topics: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    topics.into_iter().map(|topic| format!("{topic}.>")).collect()
}

/// Rebuilds a [`BusMessage`] from a delivered subject, headers, and body.
/// The topic is the first subject token; the key is the rest.
#[must_use]
pub fn to_bus_message(subject: &str, headers: Option<&HeaderMap>, payload: &[u8]) -> BusMessage {
    let (topic, key) = subject.split_once('.').unwrap_or((subject, ""));

    let mut forwarded = BTreeMap::new();
    let mut id = String::new();
    if let Some(headers) = headers {
        for name in FORWARDED_HEADERS {
            if let Some(value) = headers.get(name) {
                forwarded.insert(name.to_owned(), value.as_str().to_owned());
            }
        }
        if let Some(value) = headers.get(NATS_MESSAGE_ID) {
            value.as_str().clone_into(&mut id);
        }
    }

    BusMessage {
        id,
        topic: topic.to_owned(),
        key: key.to_owned(),
        headers: forwarded,
        payload: payload.to_vec(),
    }
}

/// `MessageBus` backed by a `JetStream` context. A send returns once the
/// stream has stored the message.
#[derive(Debug, Clone)]
pub struct JetStreamMessageBus {
    context: jetstream::Context,
}

impl JetStreamMessageBus {
    #[must_use]
    pub fn new(client: async_nats::Client) -> Self {
        Self {
            context: jetstream::new(client),
        }
    }

    #[must_use]
    pub fn context(&self) -> &jetstream::Context {
        &self.context
    }

    /// Creates the stream capturing every subject of `topics` if it does not
    /// exist yet.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Transport` if the server refuses.
    pub async fn ensure_stream<'a>(
        &self,
        stream_name: &str,
        topics: impl IntoIterator<Item = &'a str>,
    ) -> Result<jetstream::stream::Stream, DomainError> {
        let stream = self
            .context
            .get_or_create_stream(jetstream::stream::Config {
                name: stream_name.to_owned(),
                subjects: subject_filters(topics),
                retention: jetstream::stream::RetentionPolicy::Limits,
                storage: jetstream::stream::StorageType::File,
                ..Default::default()
            })
            .await
            .map_err(transport)?;
        info!(stream_name, "jetstream stream ready");
        Ok(stream)
    }
}

#[async_trait]
impl MessageBus for JetStreamMessageBus {
    #[tracing::instrument(skip(self, message), fields(topic = %message.topic, key = %message.key))]
    async fn send(&self, message: BusMessage) -> Result<(), DomainError> {
        let subject = subject_for(&message);

        let mut headers = HeaderMap::new();
        for (name, value) in &message.headers {
            headers.insert(name.as_str(), value.as_str());
        }
        if !message.id.is_empty() {
            headers.insert(NATS_MESSAGE_ID, message.id.as_str());
        }

        let ack = self
            .context
            .publish_with_headers(subject, headers, Bytes::from(message.payload))
            .await
            .map_err(transport)?
            .await
            .map_err(transport)?;

        debug!(
            stream = %ack.stream,
            sequence = ack.sequence,
            duplicate = ack.duplicate,
            "message acknowledged"
        );
        Ok(())
    }
}

/// What the consumer loop does with one item of the pull stream.
#[derive(Debug, PartialEq, Eq)]
enum Delivery<T> {
    Message(T),
    /// A failed pull, such as a missed heartbeat; the loop keeps going.
    Skip,
    Closed,
}

fn triage_delivery<T, E: std::fmt::Display>(delivery: Option<Result<T, E>>) -> Delivery<T> {
    match delivery {
        Some(Ok(message)) => Delivery::Message(message),
        Some(Err(err)) => {
            warn!(error = %err, "failed to pull delivery");
            Delivery::Skip
        }
        None => {
            warn!("message stream closed");
            Delivery::Closed
        }
    }
}

/// Durable pull consumer settings.
#[derive(Debug, Clone)]
pub struct ConsumerSettings {
    pub stream_name: String,
    pub consumer_name: String,
}

/// Consumes every registered topic until `shutdown` resolves, acking, naking,
/// or terminating each delivery according to its consume result. Messages
/// are handled one at a time.
///
/// # Errors
///
/// Returns `DomainError::Transport` if the consumer cannot be created.
pub async fn run_consumer(
    bus: &JetStreamMessageBus,
    settings: &ConsumerSettings,
    subscriptions: &Subscriptions,
    shutdown: impl Future<Output = ()>,
) -> Result<(), DomainError> {
    let stream = bus
        .ensure_stream(&settings.stream_name, subscriptions.topics())
        .await?;

    let consumer = stream
        .get_or_create_consumer(
            &settings.consumer_name,
            pull::Config {
                durable_name: Some(settings.consumer_name.clone()),
                ack_policy: AckPolicy::Explicit,
                filter_subjects: subject_filters(subscriptions.topics()),
                ..Default::default()
            },
        )
        .await
        .map_err(transport)?;

    let mut messages = consumer.messages().await.map_err(transport)?;
    info!(
        stream_name = %settings.stream_name,
        consumer_name = %settings.consumer_name,
        "consumer started"
    );

    tokio::pin!(shutdown);
    loop {
        let delivery = tokio::select! {
            () = &mut shutdown => {
                info!("consumer stopping");
                return Ok(());
            }
            delivery = messages.next() => delivery,
        };

        let message = match triage_delivery(delivery) {
            Delivery::Message(message) => message,
            Delivery::Skip => continue,
            Delivery::Closed => return Ok(()),
        };

        let bus_message = to_bus_message(
            message.subject.as_str(),
            message.headers.as_ref(),
            &message.payload,
        );
        let result = subscriptions.dispatch(&bus_message).await;

        let acked = match result.disposition() {
            Disposition::Ack => message.ack().await,
            Disposition::Nak => {
                warn!(subject = %message.subject, "delivery failed, requesting redelivery");
                message.ack_with(AckKind::Nak(None)).await
            }
            Disposition::Term => {
                warn!(subject = %message.subject, "terminating undeliverable message");
                message.ack_with(AckKind::Term).await
            }
        };
        if let Err(err) = acked {
            warn!(subject = %message.subject, error = %err, "failed to acknowledge delivery");
        }
    }
}
