use chrono::{DateTime, Utc};

#[derive(Debug, Clone, PartialEq)]
pub struct Rate {
    pub from_asset: String,
    pub to_asset: String,
    pub rate: f64,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HistoricalRate {
    pub from_asset: String,
    pub to_asset: String,
    pub rate: f64,
    pub created_at: DateTime<Utc>,
}
