use crate::model::coupon::{Coupon as CouponModel, CouponType};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct CouponResponse {
    pub id: i32,
    pub code: String,
    pub discount_type: CouponType,
    pub value: i64,
    pub min_total: i64,
    pub active: bool,
    pub start_date: String,
    pub end_date: Option<String>,
}

impl From<CouponModel> for CouponResponse {
    fn from(value: CouponModel) -> Self {
        CouponResponse {
            id: value.coupon_id,
            code: value.code,
            discount_type: value.discount_type,
            value: value.value,
            min_total: value.min_total,
            active: value.active,
            start_date: value.start_date.to_string(),
            end_date: value.end_date.map(|dt| dt.to_string()),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct CouponValidationResponse {
    pub coupon: CouponResponse,
    pub subtotal: i64,
    pub discount_amount: i64,
    pub total: i64,
}
