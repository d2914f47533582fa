use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerEntryType {
    Transfer,
    Fee,
}

impl LedgerEntryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LedgerEntryType::Transfer => "transfer",
            LedgerEntryType::Fee => "fee",
        }
    }
}

/// One append-only row of `ledger_history`. `amount` is signed: negative for
/// the debiting side of an entry, positive for the crediting side.
#[derive(Debug, Clone)]
pub struct LedgerEntry {
    pub account: String,
    pub asset: String,
    pub amount: f64,
    pub entry_type: LedgerEntryType,
    pub transfer_id: uuid::Uuid,
    pub created_at: DateTime<Utc>,
}

impl LedgerEntry {
    pub fn new(
        account: impl Into<String>,
        asset: impl Into<String>,
        amount: f64,
        entry_type: LedgerEntryType,
        transfer_id: uuid::Uuid,
    ) -> Self {
        Self {
            account: account.into(),
            asset: asset.into(),
            amount,
            entry_type,
            transfer_id,
            created_at: Utc::now(),
        }
    }
}
