use crate::model::{
    order::{Order as OrderModel, OrderStatus, PaymentStatus},
    order_item::OrderItem as OrderItemModel,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct OrderResponse {
    pub id: i32,
    pub user_id: i32,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub subtotal: i64,
    pub discount_amount: i64,
    pub total: i64,
    pub coupon_id: Option<i32>,
    pub shipping_address: String,
    pub created_at: String,
}

// model to response
impl From<OrderModel> for OrderResponse {
    fn from(value: OrderModel) -> Self {
        OrderResponse {
            id: value.order_id,
            user_id: value.user_id,
            status: value.status,
            payment_status: value.payment_status,
            subtotal: value.subtotal,
            discount_amount: value.discount_amount,
            total: value.total,
            coupon_id: value.coupon_id,
            shipping_address: value.shipping_address,
            created_at: value.created_at.to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct OrderItemResponse {
    pub id: i32,
    pub product_id: i32,
    pub product_name: Option<String>,
    pub quantity: i32,
    pub unit_price: i64,
    pub line_total: i64,
}

impl OrderItemResponse {
    pub fn new(item: OrderItemModel, product_name: Option<String>) -> Self {
        OrderItemResponse {
            id: item.order_item_id,
            product_id: item.product_id,
            product_name,
            quantity: item.quantity,
            unit_price: item.unit_price,
            line_total: item.unit_price * i64::from(item.quantity),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct OrderDetailResponse {
    pub order: OrderResponse,
    pub items: Vec<OrderItemResponse>,
}
