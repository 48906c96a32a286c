use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const ORDER_CREATED_TOPIC: &str = "order.created";
pub const STOCK_CHANGED_TOPIC: &str = "stock.changed";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct OrderItemEvent {
    pub product_id: i32,
    pub quantity: i32,
    pub unit_price: i64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum OrderEvent {
    Created {
        order_id: i32,
        user_id: i32,
        total: i64,
        items: Vec<OrderItemEvent>,
    },
}

impl OrderEvent {
    pub fn order_id(&self) -> i32 {
        match self {
            OrderEvent::Created { order_id, .. } => *order_id,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct StockChangedEvent {
    pub product_id: i32,
    pub new_stock: i32,
    pub timestamp: DateTime<Utc>,
}
