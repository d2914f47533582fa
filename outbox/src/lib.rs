// outbox/src/lib.rs
pub mod adapters;
pub mod error;
pub mod transfer;

pub use error::OutboxError;
pub use transfer::{OutgoingTransfer, TransferStatus, TransferType};

use async_trait::async_trait;
use uuid::Uuid;

#[async_trait]
pub trait OutboxAdapter: Send + Sync {
    /// Insert a fresh row, `status = Unsent`, `lease_id = None`.
    async fn insert_unsent(&self, transfer: OutgoingTransfer) -> Result<(), OutboxError>;

    /// Read-only lookup, no lease side effect.
    async fn get(&self, transfer_id: Uuid) -> Result<OutgoingTransfer, OutboxError>;

    /// Atomically claim a row: `SET lease_id = new WHERE transfer_id = ? AND lease_id IS NULL`.
    /// Fails if the row is already leased or doesn't exist.
    async fn lease(&self, transfer_id: Uuid) -> Result<OutgoingTransfer, OutboxError>;

    /// Release a held lease and set the terminal status in one step, guarded
    /// by `lease_id IS NOT NULL` so a non-owner can never complete someone
    /// else's row.
    async fn complete_and_release(
        &self,
        transfer_id: Uuid,
        status: TransferStatus,
        sent_amount: Option<f64>,
        failure_reason: Option<String>,
    ) -> Result<OutgoingTransfer, OutboxError>;

    /// Up to `limit` rows with `status = Unsent AND lease_id IS NULL`,
    /// oldest first.
    async fn list_unsent_oldest(&self, limit: i64) -> Result<Vec<OutgoingTransfer>, OutboxError>;
}
