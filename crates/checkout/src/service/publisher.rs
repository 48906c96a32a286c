use crate::domain::event::{
    ORDER_CREATED_TOPIC, OrderEvent, STOCK_CHANGED_TOPIC, StockChangedEvent,
};
use shared::abstract_trait::DynKafka;
use tracing::{error, info};

/// Post-commit notifications. Delivery is best effort: failures are logged
/// and never reach the caller, whose transaction has already committed.
#[derive(Clone)]
pub struct EventPublisher {
    kafka: DynKafka,
}

impl EventPublisher {
    pub fn new(kafka: DynKafka) -> Self {
        Self { kafka }
    }

    pub async fn order_created(&self, event: &OrderEvent) {
        let key = event.order_id().to_string();
        self.publish(ORDER_CREATED_TOPIC, &key, event).await;
    }

    pub async fn stock_changed(&self, event: &StockChangedEvent) {
        let key = event.product_id.to_string();
        self.publish(STOCK_CHANGED_TOPIC, &key, event).await;
    }

    async fn publish<T: serde::Serialize>(&self, topic: &str, key: &str, event: &T) {
        let payload = match serde_json::to_vec(event) {
            Ok(payload) => payload,
            Err(e) => {
                error!(topic, key, "❌ Failed to serialize event: {e}");
                return;
            }
        };

        match self.kafka.publish(topic, key, &payload).await {
            Ok(()) => info!(topic, key, "📤 Event published"),
            Err(e) => error!(topic, key, "❌ Failed to publish event: {e:?}"),
        }
    }
}
