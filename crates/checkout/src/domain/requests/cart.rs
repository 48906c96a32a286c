use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Validate, Clone)]
pub struct AddCartItemRequest {
    #[validate(range(min = 1))]
    pub user_id: i32,

    #[validate(range(min = 1))]
    pub product_id: i32,

    /// Signed change to the line's quantity; a result of zero or less removes the line.
    pub quantity: i32,
}

#[derive(Debug, Serialize, Deserialize, Validate, Clone)]
pub struct UpdateCartItemRequest {
    #[validate(range(min = 1))]
    pub user_id: i32,

    #[validate(range(min = 1))]
    pub cart_item_id: i32,

    pub quantity: i32,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GuestCartItem {
    pub product_id: i32,
    pub quantity: i32,
}

#[derive(Debug, Serialize, Deserialize, Validate, Clone)]
pub struct MergeGuestCartRequest {
    #[validate(range(min = 1))]
    pub user_id: i32,

    pub items: Vec<GuestCartItem>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CreateCartItemRecordRequest {
    pub cart_id: i32,
    pub product_id: i32,
    pub quantity: i32,
    pub unit_price: i64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct UpdateCartItemRecordRequest {
    pub cart_id: i32,
    pub cart_item_id: i32,
    pub quantity: i32,
    pub unit_price: i64,
}
