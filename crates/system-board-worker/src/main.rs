//! System Board worker entry point.

use system_board_worker::config::WorkerConfig;
use system_board_worker::error::WorkerError;
use system_board_worker::telemetry;

#[tokio::main]
async fn main() -> Result<(), WorkerError> {
    let config = WorkerConfig::from_env()?;
    let telemetry = telemetry::init(config.otlp_endpoint.as_deref())?;

    tracing::info!(
        stream_name = %config.bus_stream_name,
        consumer_name = %config.consumer_name,
        "Starting System Board worker"
    );

    let result = system_board_worker::run(&config, async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    })
    .await;

    if let Err(err) = &result {
        tracing::error!(error = %err, "worker stopped with an error");
    }
    telemetry.shutdown();
    result
}
