use async_trait::async_trait;
use sqlx::{PgPool, Row};
use std::collections::HashMap;

use crate::balance::LedgerBalance;
use crate::entry::LedgerEntryType;
use crate::error::LedgerError;
use crate::instruction::{TransferInstruction, TransferOutcome, SYSTEM_ACCOUNT};
use crate::LedgerAdapter;

pub struct PostgresLedgerAdapter {
    pool: PgPool,
}

impl PostgresLedgerAdapter {
    pub async fn connect(pool: PgPool) -> Result<Self, LedgerError> {
        init_ledger_schema(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

async fn init_ledger_schema(pool: &PgPool) -> Result<(), LedgerError> {
    let mut tx = pool
        .begin()
        .await
        .map_err(|e| LedgerError::Storage(e.to_string()))?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS ledger (
            account TEXT NOT NULL,
            asset TEXT NOT NULL,
            balance DOUBLE PRECISION NOT NULL DEFAULT 0,
            PRIMARY KEY (account, asset)
        )
        "#,
    )
    .execute(&mut *tx)
    .await
    .map_err(|e| LedgerError::Storage(e.to_string()))?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS ledger_history (
            id BIGSERIAL PRIMARY KEY,
            account TEXT NOT NULL,
            asset TEXT NOT NULL,
            amount DOUBLE PRECISION NOT NULL,
            entry_type TEXT NOT NULL,
            transfer_id UUID NOT NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT now()
        )
        "#,
    )
    .execute(&mut *tx)
    .await
    .map_err(|e| LedgerError::Storage(e.to_string()))?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS ledger_history_account_asset_idx \
         ON ledger_history (account, asset, created_at)",
    )
    .execute(&mut *tx)
    .await
    .map_err(|e| LedgerError::Storage(e.to_string()))?;

    tx.commit()
        .await
        .map_err(|e| LedgerError::Storage(e.to_string()))?;
    Ok(())
}

/// Row locks in the fixed order the ledger protocol requires: sender's
/// source balance, recipient's destination balance, then (unless the
/// sender already is `system`) the system account's source-asset balance,
/// which is where a fee would land. Duplicates — e.g. a self-transfer, or
/// the recipient being `system` already — are dropped, keeping first
/// occurrence, so the same row is never locked twice in one transaction.
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

#[async_trait]
impl LedgerAdapter for PostgresLedgerAdapter {
    async fn ensure_account(&self, account: &str, asset: &str) -> Result<(), LedgerError> {
        sqlx::query(
            "INSERT INTO ledger (account, asset, balance) VALUES ($1, $2, 0) \
             ON CONFLICT (account, asset) DO NOTHING",
        )
        .bind(account)
        .bind(asset)
        .execute(&self.pool)
        .await
        .map_err(|e| LedgerError::Storage(e.to_string()))?;
        Ok(())
    }

    async fn get_balances(&self, account: &str) -> Result<Vec<LedgerBalance>, LedgerError> {
        let balance_rows = sqlx::query("SELECT asset, balance FROM ledger WHERE account = $1")
            .bind(account)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| LedgerError::Storage(e.to_string()))?;

        let flow_rows = sqlx::query(
            r#"
            SELECT
                asset,
                COALESCE(SUM(CASE WHEN amount > 0 THEN amount ELSE 0 END), 0) AS inflow,
                COALESCE(SUM(CASE WHEN amount < 0 THEN -amount ELSE 0 END), 0) AS outflow
            FROM ledger_history
            WHERE account = $1 AND created_at >= now() - interval '24 hours'
            GROUP BY asset
            "#,
        )
        .bind(account)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| LedgerError::Storage(e.to_string()))?;

        let mut flows: HashMap<String, (f64, f64)> = HashMap::new();
        for row in flow_rows {
            let asset: String = row
                .try_get("asset")
                .map_err(|e| LedgerError::Storage(e.to_string()))?;
            let inflow: f64 = row
                .try_get("inflow")
                .map_err(|e| LedgerError::Storage(e.to_string()))?;
            let outflow: f64 = row
                .try_get("outflow")
                .map_err(|e| LedgerError::Storage(e.to_string()))?;
            flows.insert(asset, (inflow, outflow));
        }

        let mut balances = Vec::with_capacity(balance_rows.len());
        for row in balance_rows {
            let asset: String = row
                .try_get("asset")
                .map_err(|e| LedgerError::Storage(e.to_string()))?;
            let amount: f64 = row
                .try_get("balance")
                .map_err(|e| LedgerError::Storage(e.to_string()))?;
            let (inflow, outflow) = flows.get(&asset).copied().unwrap_or((0.0, 0.0));
            balances.push(LedgerBalance::new(asset, amount, inflow, outflow));
        }
        Ok(balances)
    }

    async fn apply_transfer(
        &self,
        instruction: &TransferInstruction,
    ) -> Result<TransferOutcome, LedgerError> {
        let locks = lock_order(instruction);

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| LedgerError::Storage(e.to_string()))?;

        let mut current: HashMap<(String, String), f64> = HashMap::new();
        for (account, asset) in &locks {
            sqlx::query(
                "INSERT INTO ledger (account, asset, balance) VALUES ($1, $2, 0) \
                 ON CONFLICT (account, asset) DO NOTHING",
            )
            .bind(account)
            .bind(asset)
            .execute(&mut *tx)
            .await
            .map_err(|e| LedgerError::Storage(e.to_string()))?;

            let row = sqlx::query(
                "SELECT balance FROM ledger WHERE account = $1 AND asset = $2 FOR UPDATE",
            )
            .bind(account)
            .bind(asset)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| LedgerError::Storage(e.to_string()))?;
            let balance: f64 = row
                .try_get("balance")
                .map_err(|e| LedgerError::Storage(e.to_string()))?;
            current.insert((account.clone(), asset.clone()), balance);
        }

        let sender_balance = *current
            .get(&(instruction.sender.clone(), instruction.from_asset.clone()))
            .unwrap();
        if sender_balance < instruction.deduct() {
            tx.rollback().await.ok();
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

        for (account, asset, amount, entry_type) in &entries {
            sqlx::query(
                "UPDATE ledger SET balance = balance + $1 WHERE account = $2 AND asset = $3",
            )
            .bind(*amount)
            .bind(account)
            .bind(asset)
            .execute(&mut *tx)
            .await
            .map_err(|e| LedgerError::Storage(e.to_string()))?;

            sqlx::query(
                "INSERT INTO ledger_history (account, asset, amount, entry_type, transfer_id) \
                 VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(account)
            .bind(asset)
            .bind(*amount)
            .bind(entry_type.as_str())
            .bind(instruction.transfer_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| LedgerError::Storage(e.to_string()))?;
        }

        tx.commit()
            .await
            .map_err(|e| LedgerError::Storage(e.to_string()))?;

        Ok(TransferOutcome {
            transfer_id: instruction.transfer_id,
            sent_amount: instruction.send_amount(),
        })
    }
}
