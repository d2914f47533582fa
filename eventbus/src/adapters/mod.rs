pub mod kafka;
pub mod memory;

pub use kafka::{KafkaConsumer, KafkaPublisher};
pub use memory::{MemoryConsumer, MemoryEventBus};
