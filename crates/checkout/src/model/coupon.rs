use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, sqlx::Type)]
#[sqlx(type_name = "coupon_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum CouponType {
    Percent,
    Fixed,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Coupon {
    pub coupon_id: i32,
    pub code: String,
    pub discount_type: CouponType,
    pub value: i64,
    pub min_total: i64,
    pub active: bool,
    pub start_date: NaiveDateTime,
    pub end_date: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
}

impl Coupon {
    /// Codes are stored upper-case and compared after trimming.
    pub fn normalize_code(code: &str) -> String {
        code.trim().to_uppercase()
    }
}
