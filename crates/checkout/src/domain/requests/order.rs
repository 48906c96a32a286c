use crate::model::order::{OrderStatus, PaymentStatus};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Validate, Clone)]
pub struct FindOrdersByUser {
    #[validate(range(min = 1))]
    pub user_id: i32,

    #[validate(range(min = 1))]
    pub page: i32,

    #[validate(range(min = 1, max = 100))]
    #[serde(rename = "page_size")]
    pub page_size: i32,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CreateOrderRecordRequest {
    pub user_id: i32,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub subtotal: i64,
    pub discount_amount: i64,
    pub total: i64,
    pub coupon_id: Option<i32>,
    pub shipping_address: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CreateOrderItemRecordRequest {
    pub order_id: i32,
    pub product_id: i32,
    pub quantity: i32,
    pub unit_price: i64,
}
