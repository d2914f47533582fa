// pricing/src/lib.rs
pub mod adapters;
pub mod error;
pub mod fee;
pub mod rate;

pub use error::PricingError;
pub use fee::Fee;
pub use rate::{HistoricalRate, Rate};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

#[async_trait]
pub trait RateAdapter: Send + Sync {
    /// Upsert the live rate and append a historical row, in one transaction.
    async fn upsert_rate(
        &self,
        from_asset: &str,
        to_asset: &str,
        rate: f64,
        timestamp: DateTime<Utc>,
    ) -> Result<(), PricingError>;

    /// Returns `1.0` for `from == to` without touching storage; otherwise
    /// the stored rate, or [`PricingError::NotFound`] if never upserted.
    async fn get_rate(&self, from_asset: &str, to_asset: &str) -> Result<f64, PricingError> {
        if from_asset == to_asset {
            return Ok(1.0);
        }
        self.get_stored_rate(from_asset, to_asset).await
    }

    /// The underlying storage lookup `get_rate` delegates to once the
    /// same-asset short circuit doesn't apply.
    async fn get_stored_rate(&self, from_asset: &str, to_asset: &str) -> Result<f64, PricingError>;

    async fn historical_rates(
        &self,
        from_asset: &str,
        to_asset: &str,
    ) -> Result<Vec<HistoricalRate>, PricingError>;
}

#[async_trait]
pub trait FeeAdapter: Send + Sync {
    async fn get_fee(&self, to_asset: &str) -> Result<Fee, PricingError>;

    /// Not present in the system this was adapted from (fees were managed
    /// directly in the database); added so a service embedding this crate
    /// has a write path for its own fee table.
    async fn set_fee(&self, to_asset: &str, fee_rate: f64) -> Result<(), PricingError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct StubRateAdapter {
        rate: Mutex<Option<f64>>,
    }

    #[async_trait]
    impl RateAdapter for StubRateAdapter {
        async fn upsert_rate(
            &self,
            _from_asset: &str,
            _to_asset: &str,
            rate: f64,
            _timestamp: DateTime<Utc>,
        ) -> Result<(), PricingError> {
            *self.rate.lock().unwrap() = Some(rate);
            Ok(())
        }

        async fn get_stored_rate(
            &self,
            _from_asset: &str,
            _to_asset: &str,
        ) -> Result<f64, PricingError> {
            self.rate.lock().unwrap().ok_or(PricingError::NotFound)
        }

        async fn historical_rates(
            &self,
            _from_asset: &str,
            _to_asset: &str,
        ) -> Result<Vec<HistoricalRate>, PricingError> {
            Ok(vec![])
        }
    }

    #[tokio::test]
    async fn same_asset_rate_short_circuits_without_storage() {
        let adapter = StubRateAdapter { rate: Mutex::new(None) };
        assert_eq!(adapter.get_rate("USD", "USD").await.unwrap(), 1.0);
    }

    #[tokio::test]
    async fn cross_asset_rate_falls_through_to_storage() {
        let adapter = StubRateAdapter { rate: Mutex::new(Some(0.9)) };
        assert_eq!(adapter.get_rate("USD", "EUR").await.unwrap(), 0.9);
    }
}
