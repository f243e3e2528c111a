mod config;

use aquawatch_runner::Runner;
use common::nats::{NatsClient, NatsConsumer};
use common::postgres::{
    PostgresClient, PostgresPushSubscriptionRepository, PostgresSensorRecordRepository,
    PostgresThresholdRepository,
};
use common::telemetry::{init_telemetry, TelemetryConfig};
use config::ServiceConfig;
use ingest_worker::domain::TelemetryIngestService;
use ingest_worker::nats::create_telemetry_processor;
use ledger_anchor::{LedgerConfig, RpcLedgerAnchor};
use push_fanout::{HttpPushSender, PushFanout};
use realtime_hub::{RealtimeServer, SensorHub};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let config = match ServiceConfig::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = init_telemetry(&TelemetryConfig {
        service_name: config.service_name.clone(),
        log_level: config.log_level.clone(),
    }) {
        eprintln!("Failed to initialize telemetry: {}", e);
        std::process::exit(1);
    }

    info!(
        stream = %config.telemetry_stream,
        subject = %config.telemetry_subject,
        "Starting aquawatch-all-in-one service"
    );

    let exit_code = match run(config).await {
        Ok(code) => code,
        Err(e) => {
            error!(error = format!("{e:#}"), "Service failed to start");
            1
        }
    };
    std::process::exit(exit_code);
}

async fn run(config: ServiceConfig) -> anyhow::Result<i32> {
    // Postgres repositories
    let postgres_client = PostgresClient::new(
        &config.postgres_host,
        config.postgres_port,
        &config.postgres_database,
        &config.postgres_username,
        &config.postgres_password,
        config.postgres_pool_size,
    )?;
    postgres_client.ping().await?;

    let record_repository = Arc::new(PostgresSensorRecordRepository::new(postgres_client.clone()));
    let threshold_repository = Arc::new(PostgresThresholdRepository::new(postgres_client.clone()));
    let subscription_repository =
        Arc::new(PostgresPushSubscriptionRepository::new(postgres_client));

    // NATS transport
    let nats_client = Arc::new(
        NatsClient::connect(
            &config.nats_url,
            Duration::from_secs(config.startup_timeout_secs),
        )
        .await?,
    );
    nats_client.ensure_stream(&config.telemetry_stream).await?;

    // Ledger anchoring
    let ledger_anchor = Arc::new(RpcLedgerAnchor::new(LedgerConfig {
        rpc_url: config.ledger_rpc_url.clone(),
        private_key: config.ledger_private_key.clone(),
        contract_address: config.ledger_contract_address.clone(),
        chain_id: config.ledger_chain_id,
        gas_limit: config.ledger_gas_limit,
        receipt_poll_interval_ms: config.ledger_receipt_poll_interval_ms,
        receipt_poll_attempts: config.ledger_receipt_poll_attempts,
    })?);

    // Alert channels
    let hub = Arc::new(SensorHub::new());
    let notifier = Arc::new(PushFanout::new(
        subscription_repository,
        Arc::new(HttpPushSender::new(Some(config.push_ttl_secs))),
    ));

    // Ingest pipeline
    let ingest_service = Arc::new(TelemetryIngestService::new(
        config.device_api_key.clone(),
        ledger_anchor,
        threshold_repository,
        record_repository,
        hub.clone(),
        notifier,
    ));

    let consumer = NatsConsumer::new(
        nats_client.jetstream(),
        &config.telemetry_stream,
        &config.telemetry_consumer_name,
        &config.telemetry_subject,
        config.nats_batch_size,
        config.nats_batch_wait_secs,
        create_telemetry_processor(ingest_service),
    )
    .await?;

    let realtime_server = RealtimeServer::new(config.ws_host.clone(), config.ws_port, hub);

    let exit_code = Runner::new()
        .with_process("ingest_worker", move |ctx| async move {
            consumer.run(ctx).await
        })
        .with_process("realtime_hub", move |ctx| async move {
            realtime_server.run(ctx).await
        })
        .with_closer("nats", {
            let nats_for_close = Arc::clone(&nats_client);
            move || async move {
                if let Ok(client) = Arc::try_unwrap(nats_for_close) {
                    client.close().await;
                }
                Ok(())
            }
        })
        .with_closer_timeout(Duration::from_secs(10))
        .run()
        .await;

    Ok(exit_code)
}
