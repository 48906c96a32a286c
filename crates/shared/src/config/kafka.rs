use async_trait::async_trait;
use rdkafka::config::ClientConfig;
use rdkafka::error::KafkaResult;
use rdkafka::producer::{FutureProducer, FutureRecord};
use tokio::time::Duration;
use tracing::info;

use crate::abstract_trait::KafkaTrait;
use crate::errors::ServiceError;

pub struct Kafka {
    producer: FutureProducer,
}

impl Kafka {
    pub fn new(brokers: &str) -> KafkaResult<Self> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("message.timeout.ms", "6000")
            .set("allow.auto.create.topics", "true")
            .set("enable.idempotence", "true")
            .set("acks", "all")
            .create()?;

        info!("Kafka producer connected successfully");

        Ok(Kafka { producer })
    }

    pub async fn send_message(&self, topic: &str, key: &str, value: &[u8]) -> KafkaResult<()> {
        self.producer
            .send(
                FutureRecord::to(topic).key(key).payload(value),
                Duration::from_secs(5),
            )
            .await
            .map_err(|(kafka_error, _message)| kafka_error)?;

        info!(topic, key, "Message sent successfully");
        Ok(())
    }
}

#[async_trait]
impl KafkaTrait for Kafka {
    async fn publish(&self, topic: &str, key: &str, value: &[u8]) -> Result<(), ServiceError> {
        self.send_message(topic, key, value)
            .await
            .map_err(ServiceError::from)
    }
}
