use crate::domain::{
    requests::coupon::{CreateCouponRequest, ValidateCouponRequest},
    response::coupon::{CouponResponse, CouponValidationResponse},
};
use async_trait::async_trait;
use shared::{domain::responses::ApiResponse, errors::ServiceError};
use std::sync::Arc;

pub type DynCouponService = Arc<dyn CouponServiceTrait + Send + Sync>;

#[async_trait]
pub trait CouponServiceTrait {
    /// Strict, advisory validation used to show "coupon applied" before
    /// checkout. Every rejection is surfaced as a `ServiceError::Coupon`.
    async fn validate_for_display(
        &self,
        req: &ValidateCouponRequest,
    ) -> Result<ApiResponse<CouponValidationResponse>, ServiceError>;
    async fn create_coupon(
        &self,
        req: &CreateCouponRequest,
    ) -> Result<ApiResponse<CouponResponse>, ServiceError>;
    async fn deactivate_coupon(
        &self,
        code: &str,
    ) -> Result<ApiResponse<CouponResponse>, ServiceError>;
}
