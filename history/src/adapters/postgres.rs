use async_trait::async_trait;
use sqlx::{PgPool, Row};

use crate::error::HistoryError;
use crate::row::TransferHistoryRow;
use crate::HistoryAdapter;

pub struct PostgresHistoryAdapter {
    pool: PgPool,
}

impl PostgresHistoryAdapter {
    pub async fn connect(pool: PgPool) -> Result<Self, HistoryError> {
        init_history_schema(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

async fn init_history_schema(pool: &PgPool) -> Result<(), HistoryError> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS transfer_history (
            id BIGSERIAL PRIMARY KEY,
            event_type TEXT NOT NULL,
            sender TEXT NOT NULL,
            payload BYTEA NOT NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT now()
        )
        "#,
    )
    .execute(pool)
    .await
    .map_err(|e| HistoryError::Storage(e.to_string()))?;
    Ok(())
}

#[async_trait]
impl HistoryAdapter for PostgresHistoryAdapter {
    async fn insert(&self, row: TransferHistoryRow) -> Result<(), HistoryError> {
        sqlx::query(
            "INSERT INTO transfer_history (event_type, sender, payload, created_at) \
             VALUES ($1, $2, $3, $4)",
        )
        .bind(row.event_type)
        .bind(row.sender)
        .bind(row.payload)
        .bind(row.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| HistoryError::Storage(e.to_string()))?;
        Ok(())
    }

    async fn list_for_sender(&self, sender: &str) -> Result<Vec<TransferHistoryRow>, HistoryError> {
        let rows = sqlx::query(
            "SELECT event_type, sender, payload, created_at FROM transfer_history \
             WHERE sender = $1 ORDER BY created_at ASC",
        )
        .bind(sender)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| HistoryError::Storage(e.to_string()))?;

        rows.iter()
            .map(|row| {
                Ok(TransferHistoryRow {
                    event_type: row
                        .try_get("event_type")
                        .map_err(|e| HistoryError::Storage(e.to_string()))?,
                    sender: row
                        .try_get("sender")
                        .map_err(|e| HistoryError::Storage(e.to_string()))?,
                    payload: row
                        .try_get("payload")
                        .map_err(|e| HistoryError::Storage(e.to_string()))?,
                    created_at: row
                        .try_get("created_at")
                        .map_err(|e| HistoryError::Storage(e.to_string()))?,
                })
            })
            .collect()
    }
}
