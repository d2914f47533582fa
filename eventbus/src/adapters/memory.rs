use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use tokio::sync::mpsc;

use crate::envelope::Envelope;
use crate::error::BusError;
use crate::event::TransferEvent;
use crate::{Consumer, Publisher};

/// In-memory stand-in for the Kafka topic, used in tests. Every registered
/// consumer group gets its own queue; publishing fans a copy of the
/// envelope out to every group, mirroring how independent consumer groups
/// on the same Kafka topic each see every message.
#[derive(Default)]
pub struct MemoryEventBus {
    groups: Mutex<HashMap<String, mpsc::UnboundedSender<Envelope>>>,
}

impl MemoryEventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, group: &str) -> MemoryConsumer {
        let (tx, rx) = mpsc::unbounded_channel();
        self.groups.lock().unwrap().insert(group.to_string(), tx);
        MemoryConsumer { rx }
    }
}

#[async_trait]
impl Publisher for MemoryEventBus {
    async fn publish(&self, event: &TransferEvent) -> Result<(), BusError> {
        let envelope = event.to_envelope()?;
        let groups = self.groups.lock().unwrap();
        for sender in groups.values() {
            // A dropped receiver means that consumer shut down; not our error.
            let _ = sender.send(envelope.clone());
        }
        Ok(())
    }
}

pub struct MemoryConsumer {
    rx: mpsc::UnboundedReceiver<Envelope>,
}

#[async_trait]
impl Consumer for MemoryConsumer {
    async fn recv(&mut self) -> Result<Envelope, BusError> {
        self.rx
            .recv()
            .await
            .ok_or_else(|| BusError::Consume("bus closed".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::TransferFields;
    use uuid::Uuid;

    fn fields() -> TransferFields {
        TransferFields {
            transfer_id: Uuid::now_v7(),
            from_asset: "USD".into(),
            to_asset: "GBP".into(),
            sender: "jim".into(),
            recipient: "system".into(),
            amount: 30000.0,
            fee: 10.0,
            rate: 0.8,
        }
    }

    #[tokio::test]
    async fn every_subscribed_group_observes_the_same_event() {
        let bus = MemoryEventBus::new();
        let mut pipeline_consumer = bus.subscribe(crate::CONSUMER_GROUP_TRANSFER_SERVICE);
        let mut history_consumer = bus.subscribe(crate::CONSUMER_GROUP_TRANSFER_HISTORY);

        bus.publish(&TransferEvent::Created(fields())).await.unwrap();

        let a = pipeline_consumer.recv().await.unwrap();
        let b = history_consumer.recv().await.unwrap();
        assert_eq!(a.event_type, "transfer_created");
        assert_eq!(b.event_type, "transfer_created");
    }
}
