use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use eventbus::{Consumer, Envelope, TransferEvent};
use outbox::{OutboxAdapter, OutgoingTransfer};

/// Consumes `transfer_created` events and turns them into outbox rows.
/// Ignores every other event type on the topic.
pub async fn run(
    mut consumer: impl Consumer,
    outbox: Arc<dyn OutboxAdapter>,
    shutdown: CancellationToken,
) {
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                tracing::info!("ingest consumer shutting down");
                return;
            }
            result = consumer.recv() => {
                match result {
                    Ok(envelope) => handle_envelope(&envelope, &outbox).await,
                    Err(err) => tracing::error!(error = %err, "ingest consumer recv failed"),
                }
            }
        }
    }
}

async fn handle_envelope(envelope: &Envelope, outbox: &Arc<dyn OutboxAdapter>) {
    let fields = match TransferEvent::from_envelope(envelope) {
        Ok(Some(TransferEvent::Created(fields))) => fields,
        Ok(Some(_)) | Ok(None) => return,
        Err(err) => {
            tracing::error!(error = %err, "failed to decode envelope");
            return;
        }
    };

    // The event carries `fee` as a rate, not an absolute amount, so the
    // persisted fee is the rate times the requested amount. A fresh
    // transfer id is minted here rather than reusing the one the HTTP
    // handler generated for the same transfer.
    let persisted_fee = fields.fee * fields.amount;
    let transfer_id = uuid::Uuid::now_v7();

    let transfer = OutgoingTransfer::new_unsent(
        transfer_id,
        fields.from_asset,
        fields.to_asset,
        fields.amount,
        persisted_fee,
        fields.rate,
        fields.sender,
        fields.recipient,
    );

    if let Err(err) = outbox.insert_unsent(transfer).await {
        tracing::error!(error = %err, "failed to insert outgoing transfer");
    }
}
