use crate::model::stock_movement::MovementType;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

#[derive(Debug, Serialize, Deserialize, Validate, Clone)]
#[validate(schema(function = "validate_adjustment_qty"))]
pub struct StockAdjustmentRequest {
    #[validate(range(min = 1))]
    pub product_id: i32,

    pub qty: i32,

    pub movement_type: MovementType,

    #[validate(length(max = 500))]
    pub reason: Option<String>,
}

fn validate_adjustment_qty(req: &StockAdjustmentRequest) -> Result<(), ValidationError> {
    match req.movement_type {
        MovementType::In | MovementType::Out if req.qty <= 0 => Err(ValidationError::new(
            "qty_not_positive",
        )
        .with_message("in/out movements need a positive qty".into())),
        MovementType::Adjust if req.qty < 0 => Err(ValidationError::new("qty_negative")
            .with_message("stock cannot be set below zero".into())),
        _ => Ok(()),
    }
}

#[derive(Debug, Serialize, Deserialize, Validate, Clone, Default)]
pub struct FindAllStockMovements {
    pub product_id: Option<i32>,

    pub movement_type: Option<MovementType>,

    #[validate(range(min = 1))]
    pub page: i32,

    #[validate(range(min = 1, max = 100))]
    #[serde(rename = "page_size")]
    pub page_size: i32,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CreateStockMovementRecordRequest {
    pub product_id: i32,
    pub movement_type: MovementType,
    pub qty: i32,
    pub reason: String,
}
