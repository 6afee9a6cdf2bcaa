//! System Board worker: runs the event-store persistence subscriber.
//!
//! The worker binds one [`EventStorePersistenceSubscriber`] to every routed
//! topic and consumes them from a durable `JetStream` consumer until
//! shutdown.

use std::future::Future;
use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use system_board_event_store::pg_event_store::PgEventStore;
use system_board_event_store::pg_processed_event_ledger::PgProcessedEventLedger;
use system_board_event_store::schema::MIGRATOR;
use system_board_messaging::nats::{ConsumerSettings, JetStreamMessageBus, run_consumer};
use system_board_messaging::subscriber::EventStorePersistenceSubscriber;
use system_board_messaging::subscriptions::Subscriptions;
use system_board_messaging::topics::ALL_TOPICS;
use tracing::info;

pub mod config;
pub mod error;
pub mod telemetry;

use config::WorkerConfig;
use error::WorkerError;

/// Registers the persistence subscriber on every routed topic.
#[must_use]
pub fn persistence_subscriptions(store: PgEventStore, ledger: PgProcessedEventLedger) -> Subscriptions {
    let subscriber = Arc::new(EventStorePersistenceSubscriber::new(store, ledger));
    let mut subscriptions = Subscriptions::new();
    for topic in ALL_TOPICS {
        subscriptions.subscribe(topic, subscriber.clone());
    }
    subscriptions
}

/// Connects to the database and the bus, then consumes until `shutdown`
/// resolves.
///
/// # Errors
///
/// Returns `WorkerError` if a connection, the migrations, or the consumer
/// fail.
pub async fn run(config: &WorkerConfig, shutdown: impl Future<Output = ()>) -> Result<(), WorkerError> {
    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await?;
    MIGRATOR.run(&pool).await?;
    info!("database migrated");

    let client = async_nats::connect(config.nats_url.as_str())
        .await
        .map_err(|e| WorkerError::Bus(e.to_string()))?;
    info!(nats_url = %config.nats_url, "connected to bus");
    let bus = JetStreamMessageBus::new(client);

    let subscriptions = persistence_subscriptions(
        PgEventStore::new(pool.clone()),
        PgProcessedEventLedger::new(pool),
    );
    let settings = ConsumerSettings {
        stream_name: config.bus_stream_name.clone(),
        consumer_name: config.consumer_name.clone(),
    };

    run_consumer(&bus, &settings, &subscriptions, shutdown).await?;
    Ok(())
}
