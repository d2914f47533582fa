use async_trait::async_trait;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::error::OutboxError;
use crate::transfer::{OutgoingTransfer, TransferStatus, TransferType};
use crate::OutboxAdapter;

pub struct PostgresOutboxAdapter {
    pool: PgPool,
}

impl PostgresOutboxAdapter {
    pub async fn connect(pool: PgPool) -> Result<Self, OutboxError> {
        init_outbox_schema(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

async fn init_outbox_schema(pool: &PgPool) -> Result<(), OutboxError> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS outgoing_transfer (
            transfer_id UUID PRIMARY KEY,
            created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
            sent_at TIMESTAMPTZ,
            from_asset TEXT NOT NULL,
            to_asset TEXT NOT NULL,
            requested_amount DOUBLE PRECISION NOT NULL,
            fee DOUBLE PRECISION NOT NULL,
            rate DOUBLE PRECISION NOT NULL,
            sent_amount DOUBLE PRECISION,
            sender TEXT NOT NULL,
            recipient TEXT NOT NULL,
            status TEXT NOT NULL,
            failure_reason TEXT,
            transfer_type TEXT NOT NULL,
            lease_id UUID
        )
        "#,
    )
    .execute(pool)
    .await
    .map_err(|e| OutboxError::Storage(e.to_string()))?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS outgoing_transfer_unsent_idx \
         ON outgoing_transfer (created_at) WHERE status = 'unsent' AND lease_id IS NULL",
    )
    .execute(pool)
    .await
    .map_err(|e| OutboxError::Storage(e.to_string()))?;

    Ok(())
}

fn row_to_transfer(row: &sqlx::postgres::PgRow) -> Result<OutgoingTransfer, OutboxError> {
    let status_str: String = row
        .try_get("status")
        .map_err(|e| OutboxError::Storage(e.to_string()))?;
    let type_str: String = row
        .try_get("transfer_type")
        .map_err(|e| OutboxError::Storage(e.to_string()))?;
    Ok(OutgoingTransfer {
        transfer_id: row
            .try_get("transfer_id")
            .map_err(|e| OutboxError::Storage(e.to_string()))?,
        created_at: row
            .try_get("created_at")
            .map_err(|e| OutboxError::Storage(e.to_string()))?,
        sent_at: row
            .try_get("sent_at")
            .map_err(|e| OutboxError::Storage(e.to_string()))?,
        from_asset: row
            .try_get("from_asset")
            .map_err(|e| OutboxError::Storage(e.to_string()))?,
        to_asset: row
            .try_get("to_asset")
            .map_err(|e| OutboxError::Storage(e.to_string()))?,
        requested_amount: row
            .try_get("requested_amount")
            .map_err(|e| OutboxError::Storage(e.to_string()))?,
        fee: row
            .try_get("fee")
            .map_err(|e| OutboxError::Storage(e.to_string()))?,
        rate: row
            .try_get("rate")
            .map_err(|e| OutboxError::Storage(e.to_string()))?,
        sent_amount: row
            .try_get("sent_amount")
            .map_err(|e| OutboxError::Storage(e.to_string()))?,
        sender: row
            .try_get("sender")
            .map_err(|e| OutboxError::Storage(e.to_string()))?,
        recipient: row
            .try_get("recipient")
            .map_err(|e| OutboxError::Storage(e.to_string()))?,
        status: TransferStatus::from_str(&status_str)
            .ok_or_else(|| OutboxError::Storage(format!("unknown status {status_str}")))?,
        failure_reason: row
            .try_get("failure_reason")
            .map_err(|e| OutboxError::Storage(e.to_string()))?,
        transfer_type: TransferType::from_str(&type_str)
            .ok_or_else(|| OutboxError::Storage(format!("unknown transfer_type {type_str}")))?,
        lease_id: row
            .try_get("lease_id")
            .map_err(|e| OutboxError::Storage(e.to_string()))?,
    })
}

#[async_trait]
impl OutboxAdapter for PostgresOutboxAdapter {
    async fn insert_unsent(&self, transfer: OutgoingTransfer) -> Result<(), OutboxError> {
        sqlx::query(
            r#"
            INSERT INTO outgoing_transfer
                (transfer_id, created_at, from_asset, to_asset, requested_amount, fee, rate,
                 sender, recipient, status, transfer_type, lease_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, NULL)
            "#,
        )
        .bind(transfer.transfer_id)
        .bind(transfer.created_at)
        .bind(transfer.from_asset)
        .bind(transfer.to_asset)
        .bind(transfer.requested_amount)
        .bind(transfer.fee)
        .bind(transfer.rate)
        .bind(transfer.sender)
        .bind(transfer.recipient)
        .bind(transfer.status.as_str())
        .bind(transfer.transfer_type.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| OutboxError::Storage(e.to_string()))?;
        Ok(())
    }

    async fn get(&self, transfer_id: Uuid) -> Result<OutgoingTransfer, OutboxError> {
        let row = sqlx::query("SELECT * FROM outgoing_transfer WHERE transfer_id = $1")
            .bind(transfer_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| OutboxError::Storage(e.to_string()))?
            .ok_or(OutboxError::NotFound)?;
        row_to_transfer(&row)
    }

    async fn lease(&self, transfer_id: Uuid) -> Result<OutgoingTransfer, OutboxError> {
        let row = sqlx::query(
            "UPDATE outgoing_transfer SET lease_id = $1 \
             WHERE transfer_id = $2 AND lease_id IS NULL RETURNING *",
        )
        .bind(Uuid::now_v7())
        .bind(transfer_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| OutboxError::Storage(e.to_string()))?
        .ok_or(OutboxError::AlreadyLockedOrNotFound)?;
        row_to_transfer(&row)
    }

    async fn complete_and_release(
        &self,
        transfer_id: Uuid,
        status: TransferStatus,
        sent_amount: Option<f64>,
        failure_reason: Option<String>,
    ) -> Result<OutgoingTransfer, OutboxError> {
        let row = sqlx::query(
            r#"
            UPDATE outgoing_transfer
            SET lease_id = NULL, sent_at = now(), status = $1, sent_amount = $2, failure_reason = $3
            WHERE transfer_id = $4 AND lease_id IS NOT NULL
            RETURNING *
            "#,
        )
        .bind(status.as_str())
        .bind(sent_amount)
        .bind(failure_reason)
        .bind(transfer_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| OutboxError::Storage(e.to_string()))?
        .ok_or(OutboxError::NotFound)?;
        row_to_transfer(&row)
    }

    async fn list_unsent_oldest(&self, limit: i64) -> Result<Vec<OutgoingTransfer>, OutboxError> {
        let rows = sqlx::query(
            "SELECT * FROM outgoing_transfer WHERE status = 'unsent' AND lease_id IS NULL \
             ORDER BY created_at ASC LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| OutboxError::Storage(e.to_string()))?;
        rows.iter().map(row_to_transfer).collect()
    }
}
