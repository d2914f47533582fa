use axum::extract::State;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::http::state::AppState;

#[derive(Debug, Deserialize)]
pub struct UpdateExchangeRateRequest {
    pub pair: String,
    pub rate: String,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
pub struct UpdateExchangeRateResponse {
    pub status: &'static str,
}

/// `POST /api/v1/exchange-rate`. `pair` is `"FROM/TO"`; `rate` and
/// `timestamp` arrive as strings and are parsed here rather than relying on
/// a typed body, matching how the rate feed this replaces sends updates.
pub async fn update_exchange_rate(
    State(state): State<AppState>,
    Json(request): Json<UpdateExchangeRateRequest>,
) -> Result<Json<UpdateExchangeRateResponse>, ApiError> {
    let parts: Vec<&str> = request.pair.split('/').collect();
    if parts.len() != 2 {
        return Err(ApiError::BadRequest(format!("invalid pair: {}", request.pair)));
    }
    let (from_asset, to_asset) = (parts[0], parts[1]);

    let rate: f64 = request
        .rate
        .parse()
        .map_err(|_| ApiError::BadRequest(format!("invalid rate: {}", request.rate)))?;

    let timestamp: DateTime<Utc> = request
        .timestamp
        .parse()
        .map_err(|_| ApiError::BadRequest(format!("invalid timestamp: {}", request.timestamp)))?;

    state
        .rates
        .upsert_rate(from_asset, to_asset, rate, timestamp)
        .await?;

    Ok(Json(UpdateExchangeRateResponse { status: "ok" }))
}
