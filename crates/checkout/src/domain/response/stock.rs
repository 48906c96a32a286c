use crate::model::{
    product::Product as ProductModel,
    stock_movement::{MovementType, StockMovement as StockMovementModel},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct StockMovementResponse {
    pub id: i32,
    pub product_id: i32,
    pub movement_type: MovementType,
    pub qty: i32,
    pub delta: i64,
    pub reason: String,
    pub created_at: String,
}

impl From<StockMovementModel> for StockMovementResponse {
    fn from(value: StockMovementModel) -> Self {
        let delta = value.delta();
        StockMovementResponse {
            id: value.movement_id,
            product_id: value.product_id,
            movement_type: value.movement_type,
            qty: value.qty,
            delta,
            reason: value.reason,
            created_at: value.created_at.to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct StockAdjustmentResponse {
    pub product_id: i32,
    pub previous_stock: i32,
    pub new_stock: i32,
    pub movement: StockMovementResponse,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct LowStockResponse {
    pub product_id: i32,
    pub name: String,
    pub stock: i32,
}

impl From<ProductModel> for LowStockResponse {
    fn from(value: ProductModel) -> Self {
        LowStockResponse {
            product_id: value.product_id,
            name: value.name,
            stock: value.stock,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq, Eq)]
pub struct LedgerReconciliationResponse {
    pub product_id: i32,
    pub opening_stock: i64,
    pub movement_total: i64,
    pub expected_stock: i64,
    pub current_stock: i64,
    pub balanced: bool,
}
