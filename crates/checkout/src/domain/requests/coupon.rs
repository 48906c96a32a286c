use crate::model::coupon::CouponType;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

#[derive(Debug, Serialize, Deserialize, Validate, Clone)]
pub struct ValidateCouponRequest {
    #[validate(length(min = 1, max = 64))]
    pub code: String,

    #[validate(range(min = 0))]
    pub subtotal: i64,
}

#[derive(Debug, Serialize, Deserialize, Validate, Clone)]
#[validate(schema(function = "validate_coupon_terms"))]
pub struct CreateCouponRequest {
    #[validate(length(min = 1, max = 64))]
    pub code: String,

    pub discount_type: CouponType,

    #[validate(range(min = 1))]
    pub value: i64,

    #[validate(range(min = 0))]
    pub min_total: i64,

    pub start_date: NaiveDateTime,

    pub end_date: Option<NaiveDateTime>,
}

fn validate_coupon_terms(req: &CreateCouponRequest) -> Result<(), ValidationError> {
    if req.discount_type == CouponType::Percent && req.value > 100 {
        return Err(ValidationError::new("percent_above_100")
            .with_message("percent coupons cannot exceed 100".into()));
    }

    if let Some(end) = req.end_date
        && end <= req.start_date
    {
        return Err(ValidationError::new("window_inverted")
            .with_message("end_date must be after start_date".into()));
    }

    Ok(())
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CreateCouponRecordRequest {
    pub code: String,
    pub discount_type: CouponType,
    pub value: i64,
    pub min_total: i64,
    pub start_date: NaiveDateTime,
    pub end_date: Option<NaiveDateTime>,
}
