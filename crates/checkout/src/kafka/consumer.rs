use crate::{domain::event::STOCK_CHANGED_TOPIC, kafka::event::StockEventHandler};
use anyhow::Result;
use rdkafka::{
    Message,
    config::ClientConfig,
    consumer::{Consumer, StreamConsumer},
    error::KafkaResult,
};
use std::sync::Arc;
use tokio::{
    sync::broadcast,
    time::{Duration, sleep},
};
use tracing::{debug, error, info, warn};

pub struct StockEventConsumer {
    consumer: StreamConsumer,
    handler: Arc<StockEventHandler>,
}

impl StockEventConsumer {
    pub fn new(brokers: &str, group_id: &str, handler: Arc<StockEventHandler>) -> KafkaResult<Self> {
        let consumer: StreamConsumer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("group.id", group_id)
            .set("enable.partition.eof", "false")
            .set("session.timeout.ms", "6000")
            .set("enable.auto.commit", "true")
            .set("auto.offset.reset", "latest")
            .create()?;

        Ok(Self { consumer, handler })
    }

    pub async fn start_with_shutdown(self, mut shutdown_rx: broadcast::Receiver<()>) -> Result<()> {
        self.consumer.subscribe(&[STOCK_CHANGED_TOPIC])?;

        info!("✅ Kafka consumer started, subscribed to {STOCK_CHANGED_TOPIC}");

        let handler = self.handler;
        let consumer = self.consumer;

        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => {
                    info!("🛑 Kafka consumer received shutdown signal");
                    break;
                }

                message_result = consumer.recv() => {
                    let message = match message_result {
                        Ok(message) => message,
                        Err(e) => {
                            error!("Kafka receive error: {e}");
                            sleep(Duration::from_secs(5)).await;
                            continue;
                        }
                    };

                    let topic = message.topic().to_string();

                    let Some(payload) = message.payload() else {
                        error!(topic, "Empty message payload");
                        continue;
                    };
                    debug!(topic, payload_len = payload.len(), "Payload received");

                    let key = message
                        .key()
                        .and_then(|k| std::str::from_utf8(k).ok())
                        .map(|s| s.to_string());

                    let event = match StockEventHandler::decode(payload) {
                        Ok(event) => event,
                        Err(e) => {
                            error!(topic, key = ?key, "Failed to deserialize event: {e}");
                            continue;
                        }
                    };

                    if let Some(key_id) = key.as_deref().and_then(|k| k.parse::<i32>().ok())
                        && key_id != event.product_id
                    {
                        warn!(
                            topic,
                            key_id,
                            event_product_id = event.product_id,
                            "Key does not match event product_id"
                        );
                    }

                    handler.handle_event(&event);
                }
            }
        }

        info!("✅ Kafka consumer stopped gracefully");
        Ok(())
    }
}
