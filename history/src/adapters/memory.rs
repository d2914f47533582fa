use async_trait::async_trait;
use std::sync::Mutex;

use crate::error::HistoryError;
use crate::row::TransferHistoryRow;
use crate::HistoryAdapter;

#[derive(Default)]
pub struct MemoryHistoryAdapter {
    rows: Mutex<Vec<TransferHistoryRow>>,
}

impl MemoryHistoryAdapter {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl HistoryAdapter for MemoryHistoryAdapter {
    async fn insert(&self, row: TransferHistoryRow) -> Result<(), HistoryError> {
        self.rows.lock().unwrap().push(row);
        Ok(())
    }

    async fn list_for_sender(&self, sender: &str) -> Result<Vec<TransferHistoryRow>, HistoryError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.sender == sender)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[tokio::test]
    async fn records_every_event_type_without_filtering() {
        let adapter = MemoryHistoryAdapter::new();
        adapter
            .insert(TransferHistoryRow {
                event_type: "transfer_created".into(),
                sender: "jim".into(),
                payload: b"{}".to_vec(),
                created_at: Utc::now(),
            })
            .await
            .unwrap();
        adapter
            .insert(TransferHistoryRow {
                event_type: "some_unrecognised_tag".into(),
                sender: "jim".into(),
                payload: b"{}".to_vec(),
                created_at: Utc::now(),
            })
            .await
            .unwrap();

        assert_eq!(adapter.list_for_sender("jim").await.unwrap().len(), 2);
    }
}
