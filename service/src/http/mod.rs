pub mod exchange_rate;
pub mod state;
pub mod transfer;

use axum::routing::post;
use axum::Router;

pub use state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/transfer", post(transfer::create_transfer))
        .route("/api/v1/exchange-rate", post(exchange_rate::update_exchange_rate))
        .with_state(state)
}
