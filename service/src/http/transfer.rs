use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use eventbus::{TransferEvent, TransferFields};

use crate::error::ApiError;
use crate::http::state::AppState;

#[derive(Debug, Deserialize)]
pub struct TransferRequest {
    pub from_asset: String,
    pub to_asset: String,
    pub amount: f64,
    pub sender: String,
    pub recipient: String,
}

#[derive(Debug, Serialize)]
pub struct TransferResponse {
    pub transfer_id: Uuid,
}

/// `POST /api/v1/transfer`. Looks up the current cross-asset rate and the
/// destination asset's fee, mints a fresh transfer id, and publishes a
/// `transfer_created` event for the ingest consumer to pick up. The ledger
/// is never touched synchronously here — this only records intent.
pub async fn create_transfer(
    State(state): State<AppState>,
    Json(request): Json<TransferRequest>,
) -> Result<(StatusCode, Json<TransferResponse>), ApiError> {
    if request.amount <= 0.0 {
        return Err(ApiError::BadRequest("amount must be positive".to_string()));
    }
    if request.from_asset.is_empty() || request.to_asset.is_empty() {
        return Err(ApiError::BadRequest("from_asset and to_asset are required".to_string()));
    }

    let rate = state.rates.get_rate(&request.from_asset, &request.to_asset).await?;
    let fee = state.fees.get_fee(&request.to_asset).await?;

    let transfer_id = Uuid::now_v7();
    let event = TransferEvent::Created(TransferFields {
        transfer_id,
        from_asset: request.from_asset,
        to_asset: request.to_asset,
        sender: request.sender,
        recipient: request.recipient,
        amount: request.amount,
        fee: fee.fee_rate,
        rate,
    });

    state.publisher.publish(&event).await.map_err(|e| ApiError::Internal(e.to_string()))?;

    Ok((StatusCode::CREATED, Json(TransferResponse { transfer_id })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn state() -> AppState {
        AppState {
            rates: Arc::new(pricing::adapters::memory::MemoryRateAdapter::new()),
            fees: Arc::new(pricing::adapters::memory::MemoryFeeAdapter::new()),
            publisher: Arc::new(eventbus::adapters::memory::MemoryEventBus::new()),
        }
    }

    #[tokio::test]
    async fn non_positive_amount_is_rejected_before_any_lookup() {
        let err = create_transfer(
            State(state()),
            Json(TransferRequest {
                from_asset: "USD".into(),
                to_asset: "GBP".into(),
                amount: 0.0,
                sender: "jim".into(),
                recipient: "alice".into(),
            }),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }
}
