use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use eventbus::Consumer;
use history::{HistoryAdapter, TransferHistoryRow};

/// Records every event observed on its consumer group with no filtering or
/// dedup, independent of the ingest consumer's own subscription.
pub async fn run(
    mut consumer: impl Consumer,
    history: Arc<dyn HistoryAdapter>,
    shutdown: CancellationToken,
) {
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                tracing::info!("history projector shutting down");
                return;
            }
            result = consumer.recv() => {
                match result {
                    Ok(envelope) => {
                        let created_at = chrono::DateTime::from_timestamp_millis(envelope.timestamp_ms)
                            .unwrap_or_else(chrono::Utc::now);
                        let row = TransferHistoryRow {
                            event_type: envelope.event_type,
                            sender: envelope.sender,
                            payload: envelope.payload,
                            created_at,
                        };
                        if let Err(err) = history.insert(row).await {
                            tracing::error!(error = %err, "failed to record transfer history");
                        }
                    }
                    Err(err) => tracing::error!(error = %err, "history projector recv failed"),
                }
            }
        }
    }
}
