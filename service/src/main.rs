use std::sync::Arc;
use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use eventbus::adapters::kafka::{KafkaConsumer, KafkaPublisher};
use eventbus::{CONSUMER_GROUP_TRANSFER_HISTORY, CONSUMER_GROUP_TRANSFER_SERVICE};
use history::adapters::postgres::PostgresHistoryAdapter;
use ledger::adapters::postgres::PostgresLedgerAdapter;
use outbox::adapters::postgres::PostgresOutboxAdapter;
use pricing::adapters::postgres::PostgresPricingAdapter;

use service::config::Config;
use service::http::AppState;
use service::{http, pipeline, rebalancer};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .json()
        .init();

    let config = Config::from_env()?;
    tracing::info!(port = config.port, "starting transfer service");

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await?;

    let ledger_adapter: Arc<dyn ledger::LedgerAdapter> =
        Arc::new(PostgresLedgerAdapter::connect(pool.clone()).await?);
    let outbox_adapter: Arc<dyn outbox::OutboxAdapter> =
        Arc::new(PostgresOutboxAdapter::connect(pool.clone()).await?);
    let pricing_adapter = Arc::new(PostgresPricingAdapter::connect(pool.clone()).await?);
    let rate_adapter: Arc<dyn pricing::RateAdapter> = pricing_adapter.clone();
    let fee_adapter: Arc<dyn pricing::FeeAdapter> = pricing_adapter;
    let history_adapter: Arc<dyn history::HistoryAdapter> =
        Arc::new(PostgresHistoryAdapter::connect(pool.clone()).await?);

    let publisher: Arc<dyn eventbus::Publisher> =
        Arc::new(KafkaPublisher::new(&config.kafka_bootstrap_servers)?);
    let ingest_consumer = KafkaConsumer::new(
        &config.kafka_bootstrap_servers,
        CONSUMER_GROUP_TRANSFER_SERVICE,
    )?;
    let history_consumer = KafkaConsumer::new(
        &config.kafka_bootstrap_servers,
        CONSUMER_GROUP_TRANSFER_HISTORY,
    )?;

    let shutdown = CancellationToken::new();

    let ingest_handle = tokio::spawn(pipeline::ingest::run(
        ingest_consumer,
        outbox_adapter.clone(),
        shutdown.clone(),
    ));
    let dispatcher_handle = tokio::spawn(pipeline::dispatcher::run(
        outbox_adapter.clone(),
        ledger_adapter.clone(),
        publisher.clone(),
        Duration::from_secs(config.outbox_poll_frequency_sec),
        shutdown.clone(),
    ));
    let history_handle = tokio::spawn(pipeline::history_projector::run(
        history_consumer,
        history_adapter.clone(),
        shutdown.clone(),
    ));
    let rebalancer_handle = tokio::spawn(rebalancer::run(
        ledger_adapter.clone(),
        publisher.clone(),
        Duration::from_secs(config.pool_rebalancer_poll_frequency_sec),
        shutdown.clone(),
    ));

    let state = AppState {
        rates: rate_adapter,
        fees: fee_adapter,
        publisher: publisher.clone(),
    };
    let request_id_header = axum::http::HeaderName::from_static("x-request-id");
    let middleware = tower::ServiceBuilder::new()
        .layer(SetRequestIdLayer::new(request_id_header.clone(), MakeRequestUuid))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::new(request_id_header));
    let app = http::router(state).layer(middleware);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port)).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown.clone()))
        .await?;

    ingest_handle.await?;
    dispatcher_handle.await?;
    history_handle.await?;
    rebalancer_handle.await?;

    Ok(())
}

async fn shutdown_signal(token: CancellationToken) {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received");
    token.cancel();
}
