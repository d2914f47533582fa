use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Mutex;

use crate::error::PricingError;
use crate::fee::Fee;
use crate::rate::HistoricalRate;
use crate::{FeeAdapter, RateAdapter};

#[derive(Default)]
pub struct MemoryRateAdapter {
    live: Mutex<HashMap<(String, String), f64>>,
    history: Mutex<Vec<HistoricalRate>>,
}

impl MemoryRateAdapter {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RateAdapter for MemoryRateAdapter {
    async fn upsert_rate(
        &self,
        from_asset: &str,
        to_asset: &str,
        rate: f64,
        timestamp: DateTime<Utc>,
    ) -> Result<(), PricingError> {
        self.live
            .lock()
            .unwrap()
            .insert((from_asset.to_string(), to_asset.to_string()), rate);
        self.history.lock().unwrap().push(HistoricalRate {
            from_asset: from_asset.to_string(),
            to_asset: to_asset.to_string(),
            rate,
            created_at: timestamp,
        });
        Ok(())
    }

    async fn get_stored_rate(&self, from_asset: &str, to_asset: &str) -> Result<f64, PricingError> {
        self.live
            .lock()
            .unwrap()
            .get(&(from_asset.to_string(), to_asset.to_string()))
            .copied()
            .ok_or(PricingError::NotFound)
    }

    async fn historical_rates(
        &self,
        from_asset: &str,
        to_asset: &str,
    ) -> Result<Vec<HistoricalRate>, PricingError> {
        Ok(self
            .history
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.from_asset == from_asset && r.to_asset == to_asset)
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub struct MemoryFeeAdapter {
    fees: Mutex<HashMap<String, f64>>,
}

impl MemoryFeeAdapter {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FeeAdapter for MemoryFeeAdapter {
    async fn get_fee(&self, to_asset: &str) -> Result<Fee, PricingError> {
        self.fees
            .lock()
            .unwrap()
            .get(to_asset)
            .copied()
            .map(|fee_rate| Fee { fee_rate })
            .ok_or(PricingError::NotFound)
    }

    async fn set_fee(&self, to_asset: &str, fee_rate: f64) -> Result<(), PricingError> {
        self.fees.lock().unwrap().insert(to_asset.to_string(), fee_rate);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn rate_round_trip_appends_history_on_each_upsert() {
        let adapter = MemoryRateAdapter::new();
        let t0 = Utc::now();
        adapter.upsert_rate("USD", "EUR", 0.9, t0).await.unwrap();
        assert_eq!(adapter.get_rate("USD", "EUR").await.unwrap(), 0.9);
        assert_eq!(adapter.historical_rates("USD", "EUR").await.unwrap().len(), 1);

        let t1 = t0 + chrono::Duration::seconds(1);
        adapter.upsert_rate("USD", "EUR", 0.95, t1).await.unwrap();
        assert_eq!(adapter.get_rate("USD", "EUR").await.unwrap(), 0.95);
        assert_eq!(adapter.historical_rates("USD", "EUR").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn fee_lookup_misses_until_set() {
        let adapter = MemoryFeeAdapter::new();
        assert!(matches!(
            adapter.get_fee("GBP").await.unwrap_err(),
            PricingError::NotFound
        ));
        adapter.set_fee("GBP", 10.0).await.unwrap();
        assert_eq!(adapter.get_fee("GBP").await.unwrap().fee_rate, 10.0);
    }
}
