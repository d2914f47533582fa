// eventbus/src/lib.rs
pub mod adapters;
pub mod envelope;
pub mod error;
pub mod event;

pub use envelope::{Envelope, TRANSFER_TOPIC};
pub use error::BusError;
pub use event::{TransferEvent, TransferFields};

use async_trait::async_trait;

pub const CONSUMER_GROUP_TRANSFER_SERVICE: &str = "sphere-transfer-service-consumer";
pub const CONSUMER_GROUP_TRANSFER_HISTORY: &str = "sphere-transfer-history-service-consumer";

#[async_trait]
pub trait Publisher: Send + Sync {
    /// Publish keyed by `event.sender()`, so every event for one account
    /// lands on the same partition and is observed in order by a consumer.
    async fn publish(&self, event: &TransferEvent) -> Result<(), BusError>;
}

#[async_trait]
pub trait Consumer: Send + Sync {
    /// Block until the next envelope for this consumer's group arrives.
    async fn recv(&mut self) -> Result<Envelope, BusError>;
}
