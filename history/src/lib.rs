// history/src/lib.rs
pub mod adapters;
pub mod error;
pub mod row;

pub use error::HistoryError;
pub use row::TransferHistoryRow;

use async_trait::async_trait;

#[async_trait]
pub trait HistoryAdapter: Send + Sync {
    /// Persist one observed event. Never rejects on an unrecognised
    /// `event_type` — storage has no opinion on the bus's tag vocabulary.
    async fn insert(&self, row: TransferHistoryRow) -> Result<(), HistoryError>;

    async fn list_for_sender(&self, sender: &str) -> Result<Vec<TransferHistoryRow>, HistoryError>;
}
