use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use eventbus::{Publisher, TransferEvent, TransferFields};
use ledger::{LedgerAdapter, TransferInstruction};
use outbox::{OutboxAdapter, OutgoingTransfer, TransferStatus};

/// Settlement delay applied before a row is leased, keyed by destination
/// asset. Unlisted assets settle immediately.
fn transfer_delay(to_asset: &str) -> Duration {
    let secs = match to_asset {
        "USD" => 3,
        "EUR" => 2,
        "JPY" => 3,
        "GBP" => 2,
        "AUD" => 3,
        _ => 0,
    };
    Duration::from_secs(secs)
}

pub async fn run(
    outbox: Arc<dyn OutboxAdapter>,
    ledger: Arc<dyn LedgerAdapter>,
    publisher: Arc<dyn Publisher>,
    poll_interval: Duration,
    shutdown: CancellationToken,
) {
    let mut ticker = tokio::time::interval(poll_interval);
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                tracing::info!("outbox dispatcher shutting down");
                return;
            }
            _ = ticker.tick() => {
                let pending = match outbox.list_unsent_oldest(250).await {
                    Ok(rows) => rows,
                    Err(err) => {
                        tracing::error!(error = %err, "failed to list unsent transfers");
                        continue;
                    }
                };
                for transfer in pending {
                    process_transfer(&outbox, &ledger, &publisher, transfer).await;
                }
            }
        }
    }
}

/// The delay is applied before the row is leased, so a second dispatcher
/// instance polling the same outbox can observe and lease the row while
/// this one is still waiting.
async fn process_transfer(
    outbox: &Arc<dyn OutboxAdapter>,
    ledger: &Arc<dyn LedgerAdapter>,
    publisher: &Arc<dyn Publisher>,
    transfer: OutgoingTransfer,
) {
    tokio::time::sleep(transfer_delay(&transfer.to_asset)).await;

    let transfer_id = transfer.transfer_id;
    let leased = match outbox.lease(transfer_id).await {
        Ok(t) => t,
        Err(_) => return,
    };

    let instruction = TransferInstruction {
        transfer_id: leased.transfer_id,
        sender: leased.sender.clone(),
        recipient: leased.recipient.clone(),
        from_asset: leased.from_asset.clone(),
        to_asset: leased.to_asset.clone(),
        requested_amount: leased.requested_amount,
        fee: leased.fee,
        rate: leased.rate,
    };

    if let Err(err) = ledger.ensure_account(&instruction.sender, &instruction.from_asset).await {
        tracing::error!(error = %err, "failed to ensure sender account");
    }
    if let Err(err) = ledger.ensure_account(&instruction.recipient, &instruction.to_asset).await {
        tracing::error!(error = %err, "failed to ensure recipient account");
    }

    let fields = TransferFields {
        transfer_id,
        from_asset: leased.from_asset.clone(),
        to_asset: leased.to_asset.clone(),
        sender: leased.sender.clone(),
        recipient: leased.recipient.clone(),
        amount: leased.requested_amount,
        fee: leased.fee,
        rate: leased.rate,
    };

    match ledger.apply_transfer(&instruction).await {
        Ok(outcome) => {
            if let Err(err) = outbox
                .complete_and_release(transfer_id, TransferStatus::Sent, Some(outcome.sent_amount), None)
                .await
            {
                tracing::error!(error = %err, "failed to mark transfer sent");
            }
            let event = TransferEvent::Sent { transfer: fields, sent_amount: outcome.sent_amount };
            if let Err(err) = publisher.publish(&event).await {
                tracing::error!(error = %err, "failed to publish transfer_sent");
            }
        }
        Err(err) => {
            let reason = err.to_string();
            if let Err(err) = outbox
                .complete_and_release(transfer_id, TransferStatus::Failed, None, Some(reason.clone()))
                .await
            {
                tracing::error!(error = %err, "failed to mark transfer failed");
            }
            let event = TransferEvent::Failed { transfer: fields, failure_reason: reason };
            if let Err(err) = publisher.publish(&event).await {
                tracing::error!(error = %err, "failed to publish transfer_failed");
            }
        }
    }
}
