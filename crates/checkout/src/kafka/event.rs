use crate::{domain::event::StockChangedEvent, metrics::StockLevelMetrics};
use tracing::{info, warn};

pub struct StockEventHandler {
    stock_levels: StockLevelMetrics,
}

impl StockEventHandler {
    pub fn new(stock_levels: StockLevelMetrics) -> Self {
        Self { stock_levels }
    }

    pub fn decode(payload: &[u8]) -> Result<StockChangedEvent, serde_json::Error> {
        serde_json::from_slice(payload)
    }

    pub fn handle_event(&self, event: &StockChangedEvent) {
        if event.new_stock < 0 {
            warn!(
                product_id = event.product_id,
                new_stock = event.new_stock,
                "⚠️ Ignoring negative stock level"
            );
            return;
        }

        info!(
            "📦 Product {} stock is now {} (as of {})",
            event.product_id, event.new_stock, event.timestamp
        );

        self.stock_levels.set(event.product_id, event.new_stock);
    }
}
