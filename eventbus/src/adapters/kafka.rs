use async_trait::async_trait;
use rdkafka::config::ClientConfig;
use rdkafka::consumer::{Consumer as _, StreamConsumer};
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::Message;
use std::time::Duration;

use crate::envelope::{Envelope, TRANSFER_TOPIC};
use crate::error::BusError;
use crate::event::TransferEvent;
use crate::{Consumer, Publisher};

pub struct KafkaPublisher {
    producer: FutureProducer,
}

impl KafkaPublisher {
    pub fn new(bootstrap_servers: &str) -> Result<Self, BusError> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", bootstrap_servers)
            .set("message.timeout.ms", "5000")
            .create()
            .map_err(|e| BusError::Publish(e.to_string()))?;
        Ok(Self { producer })
    }
}

#[async_trait]
impl Publisher for KafkaPublisher {
    async fn publish(&self, event: &TransferEvent) -> Result<(), BusError> {
        let envelope = event.to_envelope()?;
        let wire = envelope
            .to_wire_json()
            .map_err(|e| BusError::Publish(e.to_string()))?;
        let record = FutureRecord::to(TRANSFER_TOPIC)
            .key(&envelope.sender)
            .payload(&wire);
        self.producer
            .send(record, Duration::from_secs(5))
            .await
            .map_err(|(e, _)| BusError::Publish(e.to_string()))?;
        Ok(())
    }
}

pub struct KafkaConsumer {
    consumer: StreamConsumer,
}

impl KafkaConsumer {
    /// `group_id` should be one of [`crate::CONSUMER_GROUP_TRANSFER_SERVICE`]
    /// or [`crate::CONSUMER_GROUP_TRANSFER_HISTORY`].
    pub fn new(bootstrap_servers: &str, group_id: &str) -> Result<Self, BusError> {
        let consumer: StreamConsumer = ClientConfig::new()
            .set("bootstrap.servers", bootstrap_servers)
            .set("group.id", group_id)
            .set("auto.offset.reset", "earliest")
            .set("enable.auto.commit", "true")
            .create()
            .map_err(|e| BusError::Consume(e.to_string()))?;
        consumer
            .subscribe(&[TRANSFER_TOPIC])
            .map_err(|e| BusError::Consume(e.to_string()))?;
        Ok(Self { consumer })
    }
}

#[async_trait]
impl Consumer for KafkaConsumer {
    async fn recv(&mut self) -> Result<Envelope, BusError> {
        let message = self
            .consumer
            .recv()
            .await
            .map_err(|e| BusError::Consume(e.to_string()))?;
        let bytes = message.payload().unwrap_or_default();
        Envelope::from_wire_json(bytes).map_err(BusError::Decode)
    }
}
