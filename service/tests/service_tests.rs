use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::Json;
use tokio_util::sync::CancellationToken;

use eventbus::adapters::memory::MemoryEventBus;
use eventbus::{Consumer, Publisher, CONSUMER_GROUP_TRANSFER_HISTORY, CONSUMER_GROUP_TRANSFER_SERVICE};
use history::adapters::memory::MemoryHistoryAdapter;
use history::HistoryAdapter;
use ledger::adapters::memory::MemoryLedgerAdapter;
use ledger::LedgerAdapter;
use outbox::adapters::memory::MemoryOutboxAdapter;
use outbox::{OutboxAdapter, TransferStatus};
use pricing::adapters::memory::{MemoryFeeAdapter, MemoryRateAdapter};
use pricing::{FeeAdapter, RateAdapter};

use service::http::exchange_rate::{update_exchange_rate, UpdateExchangeRateRequest};
use service::http::state::AppState;
use service::http::transfer::{create_transfer, TransferRequest};
use service::{pipeline, rebalancer};

#[tokio::test]
async fn posting_a_transfer_lands_an_outbox_row_with_the_rate_treated_fee() {
    let bus = Arc::new(MemoryEventBus::new());
    let ingest_consumer = bus.subscribe(CONSUMER_GROUP_TRANSFER_SERVICE);

    let rates = Arc::new(MemoryRateAdapter::new());
    rates.upsert_rate("USD", "GBP", 0.8, chrono::Utc::now()).await.unwrap();
    let fees = Arc::new(MemoryFeeAdapter::new());
    fees.set_fee("GBP", 0.0005).await.unwrap();

    let outbox: Arc<dyn OutboxAdapter> = Arc::new(MemoryOutboxAdapter::new());
    let shutdown = CancellationToken::new();
    let ingest_task = tokio::spawn(pipeline::ingest::run(ingest_consumer, outbox.clone(), shutdown.clone()));

    let state = AppState {
        rates: rates.clone() as Arc<dyn RateAdapter>,
        fees: fees.clone() as Arc<dyn FeeAdapter>,
        publisher: bus.clone() as Arc<dyn Publisher>,
    };

    let (status, Json(response)) = create_transfer(
        State(state),
        Json(TransferRequest {
            from_asset: "USD".to_string(),
            to_asset: "GBP".to_string(),
            amount: 30000.0,
            sender: "jim".to_string(),
            recipient: "alice".to_string(),
        }),
    )
    .await
    .unwrap();
    assert_eq!(status, axum::http::StatusCode::CREATED);

    // Give the ingest consumer a moment to process the published event.
    tokio::time::sleep(Duration::from_millis(50)).await;
    shutdown.cancel();
    ingest_task.await.unwrap();

    let rows = outbox.list_unsent_oldest(10).await.unwrap();
    assert_eq!(rows.len(), 1);
    let row = &rows[0];
    // The ingest consumer mints its own transfer id, distinct from the one
    // returned to the caller.
    assert_ne!(row.transfer_id, response.transfer_id);
    assert_eq!(row.requested_amount, 30000.0);
    // fee on the wire is a rate; persisted fee is that rate times the amount.
    assert_eq!(row.fee, 0.0005 * 30000.0);
    assert_eq!(row.sender, "jim");
    assert_eq!(row.recipient, "alice");
}

#[tokio::test]
async fn missing_rate_is_reported_as_bad_request() {
    let bus = Arc::new(MemoryEventBus::new());
    let rates = Arc::new(MemoryRateAdapter::new());
    let fees = Arc::new(MemoryFeeAdapter::new());

    let state = AppState {
        rates: rates as Arc<dyn RateAdapter>,
        fees: fees as Arc<dyn FeeAdapter>,
        publisher: bus as Arc<dyn Publisher>,
    };

    let err = create_transfer(
        State(state),
        Json(TransferRequest {
            from_asset: "USD".to_string(),
            to_asset: "XYZ".to_string(),
            amount: 100.0,
            sender: "jim".to_string(),
            recipient: "alice".to_string(),
        }),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, service::error::ApiError::RateUnavailable));
}

#[tokio::test]
async fn dispatcher_settles_a_leased_transfer_and_publishes_transfer_sent() {
    let bus = Arc::new(MemoryEventBus::new());
    let mut sent_consumer = bus.subscribe("test-sent-observer");

    let ledger_memory = MemoryLedgerAdapter::new();
    ledger_memory.set_balance("jim", "USD", 1000.0);
    let ledger: Arc<dyn LedgerAdapter> = Arc::new(ledger_memory);

    let outbox: Arc<dyn OutboxAdapter> = Arc::new(MemoryOutboxAdapter::new());
    let transfer = outbox::OutgoingTransfer::new_unsent(
        uuid::Uuid::now_v7(),
        "USD",
        "CHF",
        500.0,
        5.0,
        1.1,
        "jim",
        "alice",
    );
    let transfer_id = transfer.transfer_id;
    outbox.insert_unsent(transfer).await.unwrap();

    let shutdown = CancellationToken::new();
    let dispatcher_task = tokio::spawn(pipeline::dispatcher::run(
        outbox.clone(),
        ledger.clone(),
        bus.clone() as Arc<dyn Publisher>,
        Duration::from_millis(20),
        shutdown.clone(),
    ));

    // "CHF" carries no settlement delay, so one tick is enough.
    let envelope = tokio::time::timeout(Duration::from_secs(2), sent_consumer.recv())
        .await
        .expect("timed out waiting for transfer_sent")
        .unwrap();
    assert_eq!(envelope.event_type, "transfer_sent");

    shutdown.cancel();
    dispatcher_task.await.unwrap();

    let row = outbox.get(transfer_id).await.unwrap();
    assert_eq!(row.status, TransferStatus::Sent);
    assert_eq!(row.sent_amount, Some((500.0 - 5.0) * 1.1));

    let jim = ledger.get_balances("jim").await.unwrap();
    assert_eq!(jim[0].amount, 1000.0 - 500.0);
}

#[tokio::test]
async fn dispatcher_fails_a_transfer_with_insufficient_balance_and_publishes_the_reason() {
    let bus = Arc::new(MemoryEventBus::new());
    let mut failed_consumer = bus.subscribe("test-failed-observer");

    // jim has nowhere near enough USD to cover the requested amount.
    let ledger_memory = MemoryLedgerAdapter::new();
    ledger_memory.set_balance("jim", "USD", 10.0);
    let ledger: Arc<dyn LedgerAdapter> = Arc::new(ledger_memory);

    let outbox: Arc<dyn OutboxAdapter> = Arc::new(MemoryOutboxAdapter::new());
    let transfer = outbox::OutgoingTransfer::new_unsent(
        uuid::Uuid::now_v7(),
        "USD",
        "CHF",
        500.0,
        5.0,
        1.1,
        "jim",
        "alice",
    );
    let transfer_id = transfer.transfer_id;
    outbox.insert_unsent(transfer).await.unwrap();

    let shutdown = CancellationToken::new();
    let dispatcher_task = tokio::spawn(pipeline::dispatcher::run(
        outbox.clone(),
        ledger.clone(),
        bus.clone() as Arc<dyn Publisher>,
        Duration::from_millis(20),
        shutdown.clone(),
    ));

    let envelope = tokio::time::timeout(Duration::from_secs(2), failed_consumer.recv())
        .await
        .expect("timed out waiting for transfer_failed")
        .unwrap();
    assert_eq!(envelope.event_type, "transfer_failed");
    let payload: serde_json::Value = serde_json::from_slice(&envelope.payload).unwrap();
    assert_eq!(payload["failure_reason"], "not enough balance for transfer");

    shutdown.cancel();
    dispatcher_task.await.unwrap();

    let row = outbox.get(transfer_id).await.unwrap();
    assert_eq!(row.status, TransferStatus::Failed);
    assert_eq!(row.failure_reason.as_deref(), Some("not enough balance for transfer"));
}

#[tokio::test]
async fn history_projector_records_every_event_observed_on_its_group() {
    let bus = Arc::new(MemoryEventBus::new());
    let consumer = bus.subscribe(CONSUMER_GROUP_TRANSFER_HISTORY);
    let history: Arc<dyn HistoryAdapter> = Arc::new(MemoryHistoryAdapter::new());

    let shutdown = CancellationToken::new();
    let task = tokio::spawn(pipeline::history_projector::run(consumer, history.clone(), shutdown.clone()));

    let fields = eventbus::TransferFields {
        transfer_id: uuid::Uuid::now_v7(),
        from_asset: "USD".into(),
        to_asset: "GBP".into(),
        sender: "jim".into(),
        recipient: "alice".into(),
        amount: 1000.0,
        fee: 1.0,
        rate: 0.8,
    };
    bus.publish(&eventbus::TransferEvent::Created(fields)).await.unwrap();

    tokio::time::sleep(Duration::from_millis(50)).await;
    shutdown.cancel();
    task.await.unwrap();

    let rows = history.list_for_sender("jim").await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].event_type, "transfer_created");
}

#[tokio::test]
async fn rebalancer_tops_up_a_depleted_asset_from_the_trending_deposit() {
    let bus = Arc::new(MemoryEventBus::new());
    let mut observer = bus.subscribe("test-rebalance-observer");

    let ledger_memory = MemoryLedgerAdapter::new();
    // System pays out 60000 GBP, dropping below the 100000 floor with a
    // positive imbalance ratio. EUR is net-accumulating and becomes the
    // funding source.
    ledger_memory.set_balance("system", "GBP", 150000.0);
    ledger_memory
        .apply_transfer(&ledger::TransferInstruction {
            transfer_id: uuid::Uuid::now_v7(),
            sender: "system".into(),
            recipient: "alice".into(),
            from_asset: "GBP".into(),
            to_asset: "GBP".into(),
            requested_amount: 60000.0,
            fee: 0.0,
            rate: 1.0,
        })
        .await
        .unwrap();

    ledger_memory.set_balance("system", "EUR", 20000.0);
    ledger_memory.set_balance("alice", "EUR", 20000.0);
    ledger_memory
        .apply_transfer(&ledger::TransferInstruction {
            transfer_id: uuid::Uuid::now_v7(),
            sender: "alice".into(),
            recipient: "system".into(),
            from_asset: "EUR".into(),
            to_asset: "EUR".into(),
            requested_amount: 10000.0,
            fee: 0.0,
            rate: 1.0,
        })
        .await
        .unwrap();

    let ledger_adapter: Arc<dyn LedgerAdapter> = Arc::new(ledger_memory);
    let shutdown = CancellationToken::new();
    let task = tokio::spawn(rebalancer::run(
        ledger_adapter.clone(),
        bus.clone() as Arc<dyn Publisher>,
        Duration::from_millis(20),
        shutdown.clone(),
    ));

    let envelope = tokio::time::timeout(Duration::from_secs(2), observer.recv())
        .await
        .expect("timed out waiting for a rebalance transfer")
        .unwrap();
    assert_eq!(envelope.event_type, "transfer_created");

    shutdown.cancel();
    task.await.unwrap();
}

#[tokio::test]
async fn updating_exchange_rate_makes_it_visible_to_get_rate() {
    let bus = Arc::new(MemoryEventBus::new());
    let rates = Arc::new(MemoryRateAdapter::new());
    let fees = Arc::new(MemoryFeeAdapter::new());

    let state = AppState {
        rates: rates.clone() as Arc<dyn RateAdapter>,
        fees: fees as Arc<dyn FeeAdapter>,
        publisher: bus as Arc<dyn Publisher>,
    };

    let Json(response) = update_exchange_rate(
        State(state),
        Json(UpdateExchangeRateRequest {
            pair: "USD/EUR".to_string(),
            rate: "0.91".to_string(),
            timestamp: "2026-01-01T00:00:00Z".to_string(),
        }),
    )
    .await
    .unwrap();

    assert_eq!(response.status, "ok");
    assert_eq!(rates.get_rate("USD", "EUR").await.unwrap(), 0.91);
}
