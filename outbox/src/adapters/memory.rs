use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

use crate::error::OutboxError;
use crate::transfer::{OutgoingTransfer, TransferStatus};
use crate::OutboxAdapter;

#[derive(Default)]
pub struct MemoryOutboxAdapter {
    rows: Mutex<HashMap<Uuid, OutgoingTransfer>>,
}

impl MemoryOutboxAdapter {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OutboxAdapter for MemoryOutboxAdapter {
    async fn insert_unsent(&self, transfer: OutgoingTransfer) -> Result<(), OutboxError> {
        let mut rows = self.rows.lock().unwrap();
        rows.insert(transfer.transfer_id, transfer);
        Ok(())
    }

    async fn get(&self, transfer_id: Uuid) -> Result<OutgoingTransfer, OutboxError> {
        let rows = self.rows.lock().unwrap();
        rows.get(&transfer_id)
            .cloned()
            .ok_or(OutboxError::NotFound)
    }

    async fn lease(&self, transfer_id: Uuid) -> Result<OutgoingTransfer, OutboxError> {
        let mut rows = self.rows.lock().unwrap();
        let row = rows
            .get_mut(&transfer_id)
            .ok_or(OutboxError::AlreadyLockedOrNotFound)?;
        if row.lease_id.is_some() {
            return Err(OutboxError::AlreadyLockedOrNotFound);
        }
        row.lease_id = Some(Uuid::now_v7());
        Ok(row.clone())
    }

    async fn complete_and_release(
        &self,
        transfer_id: Uuid,
        status: TransferStatus,
        sent_amount: Option<f64>,
        failure_reason: Option<String>,
    ) -> Result<OutgoingTransfer, OutboxError> {
        let mut rows = self.rows.lock().unwrap();
        let row = rows
            .get_mut(&transfer_id)
            .ok_or(OutboxError::NotFound)?;
        if row.lease_id.is_none() {
            return Err(OutboxError::NotFound);
        }
        row.lease_id = None;
        row.sent_at = Some(Utc::now());
        row.status = status;
        row.sent_amount = sent_amount;
        row.failure_reason = failure_reason;
        Ok(row.clone())
    }

    async fn list_unsent_oldest(&self, limit: i64) -> Result<Vec<OutgoingTransfer>, OutboxError> {
        let rows = self.rows.lock().unwrap();
        let mut unsent: Vec<OutgoingTransfer> = rows
            .values()
            .filter(|t| t.status == TransferStatus::Unsent && t.lease_id.is_none())
            .cloned()
            .collect();
        unsent.sort_by_key(|t| t.created_at);
        unsent.truncate(limit.max(0) as usize);
        Ok(unsent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> OutgoingTransfer {
        OutgoingTransfer::new_unsent(Uuid::now_v7(), "USD", "GBP", 100.0, 1.0, 0.8, "jim", "system")
    }

    #[tokio::test]
    async fn lease_succeeds_once_then_rejects_second_caller() {
        let adapter = MemoryOutboxAdapter::new();
        let t = sample();
        let id = t.transfer_id;
        adapter.insert_unsent(t).await.unwrap();

        adapter.lease(id).await.unwrap();
        let err = adapter.lease(id).await.unwrap_err();
        assert!(matches!(err, OutboxError::AlreadyLockedOrNotFound));
    }

    #[tokio::test]
    async fn complete_and_release_requires_a_held_lease() {
        let adapter = MemoryOutboxAdapter::new();
        let t = sample();
        let id = t.transfer_id;
        adapter.insert_unsent(t).await.unwrap();

        let err = adapter
            .complete_and_release(id, TransferStatus::Sent, Some(79.2), None)
            .await
            .unwrap_err();
        assert!(matches!(err, OutboxError::NotFound));

        adapter.lease(id).await.unwrap();
        let done = adapter
            .complete_and_release(id, TransferStatus::Sent, Some(79.2), None)
            .await
            .unwrap();
        assert_eq!(done.status, TransferStatus::Sent);
        assert!(done.lease_id.is_none());
    }

    #[tokio::test]
    async fn list_unsent_oldest_excludes_leased_rows() {
        let adapter = MemoryOutboxAdapter::new();
        let a = sample();
        let b = sample();
        let b_id = b.transfer_id;
        adapter.insert_unsent(a).await.unwrap();
        adapter.insert_unsent(b).await.unwrap();
        adapter.lease(b_id).await.unwrap();

        let unsent = adapter.list_unsent_oldest(10).await.unwrap();
        assert_eq!(unsent.len(), 1);
        assert_ne!(unsent[0].transfer_id, b_id);
    }
}
