use crate::model::{
    cart::{Cart as CartModel, CartStatus},
    cart_item::CartItem as CartItemModel,
    product::Product as ProductModel,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct CartItemResponse {
    pub id: i32,
    pub product_id: i32,
    pub product_name: String,
    pub quantity: i32,
    pub unit_price: i64,
    pub line_total: i64,
    pub current_price: i64,
    pub available_stock: i32,
    pub is_active: bool,
}

impl CartItemResponse {
    pub fn from_parts(item: &CartItemModel, product: &ProductModel) -> Self {
        CartItemResponse {
            id: item.cart_item_id,
            product_id: item.product_id,
            product_name: product.name.clone(),
            quantity: item.quantity,
            unit_price: item.unit_price,
            line_total: item.unit_price * i64::from(item.quantity),
            current_price: product.price,
            available_stock: product.stock,
            is_active: product.is_active,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct CartResponse {
    pub id: i32,
    pub user_id: i32,
    pub status: CartStatus,
    pub items: Vec<CartItemResponse>,
    pub item_count: i32,
    pub subtotal: i64,
    pub created_at: String,
}

impl CartResponse {
    pub fn new(cart: &CartModel, items: Vec<CartItemResponse>) -> Self {
        let subtotal = items.iter().map(|item| item.line_total).sum();
        let item_count = items.iter().map(|item| item.quantity).sum();

        CartResponse {
            id: cart.cart_id,
            user_id: cart.user_id,
            status: cart.status,
            items,
            item_count,
            subtotal,
            created_at: cart.created_at.to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct SkippedGuestItem {
    pub product_id: i32,
    pub reason: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct MergeCartResponse {
    pub merged: i32,
    pub skipped: Vec<SkippedGuestItem>,
    pub cart: CartResponse,
}
