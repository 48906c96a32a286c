use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, sqlx::Type)]
#[sqlx(type_name = "stock_movement_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MovementType {
    In,
    Out,
    Adjust,
}

impl MovementType {
    pub fn default_reason(self) -> &'static str {
        match self {
            MovementType::In => "manual stock in",
            MovementType::Out => "manual stock out",
            MovementType::Adjust => "manual stock adjustment",
        }
    }
}

impl fmt::Display for MovementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MovementType::In => "in",
            MovementType::Out => "out",
            MovementType::Adjust => "adjust",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct StockMovement {
    pub movement_id: i32,
    pub product_id: i32,
    pub movement_type: MovementType,
    pub qty: i32,
    pub reason: String,
    pub created_at: NaiveDateTime,
}

impl StockMovement {
    /// Signed change this movement applied to the product's stock.
    /// `in`/`out` rows store a magnitude, `adjust` rows store the delta itself.
    pub fn delta(&self) -> i64 {
        let qty = i64::from(self.qty);
        match self.movement_type {
            MovementType::In => qty,
            MovementType::Out => -qty,
            MovementType::Adjust => qty,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn movement(movement_type: MovementType, qty: i32) -> StockMovement {
        StockMovement {
            movement_id: 1,
            product_id: 1,
            movement_type,
            qty,
            reason: "test".into(),
            created_at: Utc::now().naive_utc(),
        }
    }

    #[test]
    fn out_movements_subtract_their_magnitude() {
        assert_eq!(movement(MovementType::In, 4).delta(), 4);
        assert_eq!(movement(MovementType::Out, 4).delta(), -4);
    }

    #[test]
    fn adjust_movements_carry_a_signed_delta() {
        assert_eq!(movement(MovementType::Adjust, -3).delta(), -3);
        assert_eq!(movement(MovementType::Adjust, 5).delta(), 5);
    }
}
