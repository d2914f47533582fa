use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};

use crate::error::PricingError;
use crate::fee::Fee;
use crate::rate::HistoricalRate;
use crate::{FeeAdapter, RateAdapter};

pub struct PostgresPricingAdapter {
    pool: PgPool,
}

impl PostgresPricingAdapter {
    pub async fn connect(pool: PgPool) -> Result<Self, PricingError> {
        init_pricing_schema(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

async fn init_pricing_schema(pool: &PgPool) -> Result<(), PricingError> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS rate (
            from_asset TEXT NOT NULL,
            to_asset TEXT NOT NULL,
            rate DOUBLE PRECISION NOT NULL,
            updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
            PRIMARY KEY (from_asset, to_asset)
        )
        "#,
    )
    .execute(pool)
    .await
    .map_err(|e| PricingError::Storage(e.to_string()))?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS historical_rate (
            id BIGSERIAL PRIMARY KEY,
            from_asset TEXT NOT NULL,
            to_asset TEXT NOT NULL,
            rate DOUBLE PRECISION NOT NULL,
            created_at TIMESTAMPTZ NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await
    .map_err(|e| PricingError::Storage(e.to_string()))?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS fee (
            to_asset TEXT PRIMARY KEY,
            fee_rate DOUBLE PRECISION NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await
    .map_err(|e| PricingError::Storage(e.to_string()))?;

    Ok(())
}

#[async_trait]
impl RateAdapter for PostgresPricingAdapter {
    async fn upsert_rate(
        &self,
        from_asset: &str,
        to_asset: &str,
        rate: f64,
        timestamp: DateTime<Utc>,
    ) -> Result<(), PricingError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| PricingError::Storage(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO rate (from_asset, to_asset, rate, updated_at)
            VALUES ($1, $2, $3, now())
            ON CONFLICT (from_asset, to_asset)
            DO UPDATE SET rate = excluded.rate, updated_at = now()
            "#,
        )
        .bind(from_asset)
        .bind(to_asset)
        .bind(rate)
        .execute(&mut *tx)
        .await
        .map_err(|e| PricingError::Storage(e.to_string()))?;

        sqlx::query(
            "INSERT INTO historical_rate (from_asset, to_asset, rate, created_at) \
             VALUES ($1, $2, $3, $4)",
        )
        .bind(from_asset)
        .bind(to_asset)
        .bind(rate)
        .bind(timestamp)
        .execute(&mut *tx)
        .await
        .map_err(|e| PricingError::Storage(e.to_string()))?;

        tx.commit()
            .await
            .map_err(|e| PricingError::Storage(e.to_string()))?;
        Ok(())
    }

    async fn get_stored_rate(&self, from_asset: &str, to_asset: &str) -> Result<f64, PricingError> {
        let row = sqlx::query("SELECT rate FROM rate WHERE from_asset = $1 AND to_asset = $2")
            .bind(from_asset)
            .bind(to_asset)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| PricingError::Storage(e.to_string()))?
            .ok_or(PricingError::NotFound)?;
        row.try_get("rate")
            .map_err(|e| PricingError::Storage(e.to_string()))
    }

    async fn historical_rates(
        &self,
        from_asset: &str,
        to_asset: &str,
    ) -> Result<Vec<HistoricalRate>, PricingError> {
        let rows = sqlx::query(
            "SELECT from_asset, to_asset, rate, created_at FROM historical_rate \
             WHERE from_asset = $1 AND to_asset = $2 ORDER BY created_at ASC",
        )
        .bind(from_asset)
        .bind(to_asset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PricingError::Storage(e.to_string()))?;

        rows.iter()
            .map(|row| {
                Ok(HistoricalRate {
                    from_asset: row
                        .try_get("from_asset")
                        .map_err(|e| PricingError::Storage(e.to_string()))?,
                    to_asset: row
                        .try_get("to_asset")
                        .map_err(|e| PricingError::Storage(e.to_string()))?,
                    rate: row
                        .try_get("rate")
                        .map_err(|e| PricingError::Storage(e.to_string()))?,
                    created_at: row
                        .try_get("created_at")
                        .map_err(|e| PricingError::Storage(e.to_string()))?,
                })
            })
            .collect()
    }
}

#[async_trait]
impl FeeAdapter for PostgresPricingAdapter {
    async fn get_fee(&self, to_asset: &str) -> Result<Fee, PricingError> {
        let row = sqlx::query("SELECT fee_rate FROM fee WHERE to_asset = $1")
            .bind(to_asset)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| PricingError::Storage(e.to_string()))?
            .ok_or(PricingError::NotFound)?;
        Ok(Fee {
            fee_rate: row
                .try_get("fee_rate")
                .map_err(|e| PricingError::Storage(e.to_string()))?,
        })
    }

    async fn set_fee(&self, to_asset: &str, fee_rate: f64) -> Result<(), PricingError> {
        sqlx::query(
            "INSERT INTO fee (to_asset, fee_rate) VALUES ($1, $2) \
             ON CONFLICT (to_asset) DO UPDATE SET fee_rate = excluded.fee_rate",
        )
        .bind(to_asset)
        .bind(fee_rate)
        .execute(&self.pool)
        .await
        .map_err(|e| PricingError::Storage(e.to_string()))?;
        Ok(())
    }
}
