// ledger/src/lib.rs
pub mod adapters;
pub mod balance;
pub mod entry;
pub mod error;
pub mod instruction;

pub use balance::LedgerBalance;
pub use entry::{LedgerEntry, LedgerEntryType};
pub use error::LedgerError;
pub use instruction::{TransferInstruction, TransferOutcome, SYSTEM_ACCOUNT};

use async_trait::async_trait;

/// Storage-agnostic double-entry ledger: accounts hold a balance per asset,
/// every mutation is mirrored into an append-only history row.
#[async_trait]
pub trait LedgerAdapter: Send + Sync {
    /// Idempotently make sure `account` has a zero-balance row for `asset`.
    /// Mirrors `INSERT ... ON CONFLICT DO NOTHING` in the Postgres adapter.
    async fn ensure_account(&self, account: &str, asset: &str) -> Result<(), LedgerError>;

    /// Current balance plus 24h inflow/outflow for every asset held by `account`.
    async fn get_balances(&self, account: &str) -> Result<Vec<LedgerBalance>, LedgerError>;

    /// Debit the sender, credit the recipient and (if applicable) route the
    /// fee to the system account, atomically. Locks every distinct
    /// `(account, asset)` pair in sorted order before touching any balance,
    /// so two transfers that share an account never deadlock against each
    /// other.
    async fn apply_transfer(
        &self,
        instruction: &TransferInstruction,
    ) -> Result<TransferOutcome, LedgerError>;
}
