use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::balance::LedgerBalance;
use crate::entry::{LedgerEntry, LedgerEntryType};
use crate::error::LedgerError;
use crate::instruction::{TransferInstruction, TransferOutcome, SYSTEM_ACCOUNT};
use crate::LedgerAdapter;

#[derive(Default)]
struct MemoryStore {
    balances: HashMap<(String, String), f64>,
    history: Vec<LedgerEntry>,
}

fn lock_order(instruction: &TransferInstruction) -> Vec<(String, String)> {
    let mut pairs = vec![
        (instruction.sender.clone(), instruction.from_asset.clone()),
        (instruction.recipient.clone(), instruction.to_asset.clone()),
    ];
    if instruction.sender != SYSTEM_ACCOUNT {
        pairs.push((SYSTEM_ACCOUNT.to_string(), instruction.from_asset.clone()));
    }
    let mut seen = std::collections::HashSet::new();
    pairs.retain(|pair| seen.insert(pair.clone()));
    pairs
}

/// In-memory stand-in for [`super::postgres::PostgresLedgerAdapter`], used in
/// tests. Holds the store's mutex for the entire operation: that's this
/// adapter's equivalent of `BEGIN ... SELECT FOR UPDATE ... COMMIT`.
pub struct MemoryLedgerAdapter {
    store: Arc<Mutex<MemoryStore>>,
}

impl Default for MemoryLedgerAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryLedgerAdapter {
    pub fn new() -> Self {
        Self {
            store: Arc::new(Mutex::new(MemoryStore::default())),
        }
    }

    /// Test helper: seed a starting balance without going through a transfer.
    pub fn set_balance(&self, account: &str, asset: &str, amount: f64) {
        let mut store = self.store.lock().unwrap();
        store
            .balances
            .insert((account.to_string(), asset.to_string()), amount);
    }
}

#[async_trait]
impl LedgerAdapter for MemoryLedgerAdapter {
    async fn ensure_account(&self, account: &str, asset: &str) -> Result<(), LedgerError> {
        let mut store = self.store.lock().unwrap();
        store
            .balances
            .entry((account.to_string(), asset.to_string()))
            .or_insert(0.0);
        Ok(())
    }

    async fn get_balances(&self, account: &str) -> Result<Vec<LedgerBalance>, LedgerError> {
        let store = self.store.lock().unwrap();
        let cutoff = Utc::now() - Duration::hours(24);

        let mut balances = Vec::new();
        for ((acc, asset), amount) in &store.balances {
            if acc != account {
                continue;
            }
            let (mut inflow, mut outflow) = (0.0, 0.0);
            for entry in &store.history {
                if &entry.account != account || &entry.asset != asset || entry.created_at < cutoff
                {
                    continue;
                }
                if entry.amount > 0.0 {
                    inflow += entry.amount;
                } else {
                    outflow += -entry.amount;
                }
            }
            balances.push(LedgerBalance::new(asset.clone(), *amount, inflow, outflow));
        }
        Ok(balances)
    }

    async fn apply_transfer(
        &self,
        instruction: &TransferInstruction,
    ) -> Result<TransferOutcome, LedgerError> {
        let mut store = self.store.lock().unwrap();

        for (account, asset) in lock_order(instruction) {
            store.balances.entry((account, asset)).or_insert(0.0);
        }

        let sender_balance = *store
            .balances
            .get(&(instruction.sender.clone(), instruction.from_asset.clone()))
            .unwrap();
        if sender_balance < instruction.deduct() {
            return Err(LedgerError::InsufficientFunds {
                account: instruction.sender.clone(),
                asset: instruction.from_asset.clone(),
            });
        }

        let mut entries = vec![(
            instruction.sender.clone(),
            instruction.from_asset.clone(),
            -instruction.deduct(),
            LedgerEntryType::Transfer,
        )];
        if instruction.fee > 0.0 && !instruction.is_system_internal() {
            entries.push((
                SYSTEM_ACCOUNT.to_string(),
                instruction.from_asset.clone(),
                instruction.fee,
                LedgerEntryType::Fee,
            ));
        }
        entries.push((
            instruction.recipient.clone(),
            instruction.to_asset.clone(),
            instruction.send_amount(),
            LedgerEntryType::Transfer,
        ));

        for (account, asset, amount, entry_type) in entries {
            *store
                .balances
                .entry((account.clone(), asset.clone()))
                .or_insert(0.0) += amount;
            store
                .history
                .push(LedgerEntry::new(account, asset, amount, entry_type, instruction.transfer_id));
        }

        Ok(TransferOutcome {
            transfer_id: instruction.transfer_id,
            sent_amount: instruction.send_amount(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instr(sender: &str, recipient: &str, amount: f64, fee: f64, rate: f64) -> TransferInstruction {
        TransferInstruction {
            transfer_id: uuid::Uuid::now_v7(),
            sender: sender.into(),
            recipient: recipient.into(),
            from_asset: "USD".into(),
            to_asset: "USD".into(),
            requested_amount: amount,
            fee,
            rate,
        }
    }

    #[tokio::test]
    async fn debits_sender_credits_recipient_and_system_fee() {
        let adapter = MemoryLedgerAdapter::new();
        adapter.set_balance("jim", "USD", 30000.0);

        adapter
            .apply_transfer(&instr("jim", "alice", 1000.0, 10.0, 1.0))
            .await
            .unwrap();

        let jim = adapter.get_balances("jim").await.unwrap();
        let alice = adapter.get_balances("alice").await.unwrap();
        let system = adapter.get_balances("system").await.unwrap();

        assert_eq!(jim[0].amount, 30000.0 - 1000.0);
        assert_eq!(alice[0].amount, 990.0);
        assert_eq!(system[0].amount, 10.0);
    }

    #[tokio::test]
    async fn rejects_transfer_when_sender_balance_insufficient() {
        let adapter = MemoryLedgerAdapter::new();
        adapter.ensure_account("jim", "USD").await.unwrap();

        let err = adapter
            .apply_transfer(&instr("jim", "alice", 1000.0, 0.0, 1.0))
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientFunds { .. }));
    }

    #[tokio::test]
    async fn no_fee_entry_for_system_internal_rebalance() {
        let adapter = MemoryLedgerAdapter::new();
        adapter.set_balance("system", "USD", 12000.0);

        adapter
            .apply_transfer(&instr("system", "system", 1000.0, 0.0, 0.0))
            .await
            .unwrap();

        let store = adapter.store.lock().unwrap();
        assert!(!store
            .history
            .iter()
            .any(|e| matches!(e.entry_type, LedgerEntryType::Fee)));
    }
}
