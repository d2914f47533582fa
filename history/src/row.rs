use chrono::{DateTime, Utc};

/// One row per observed bus event, regardless of `event_type`. No filtering,
/// no dedup: the projector records whatever arrives.
#[derive(Debug, Clone)]
pub struct TransferHistoryRow {
    pub event_type: String,
    pub sender: String,
    pub payload: Vec<u8>,
    pub created_at: DateTime<Utc>,
}
