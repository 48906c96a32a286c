use crate::{domain::requests::coupon::CreateCouponRecordRequest, model::coupon::Coupon as CouponModel};
use async_trait::async_trait;
use shared::errors::RepositoryError;
use std::sync::Arc;

pub type DynCouponCommandRepository = Arc<dyn CouponCommandRepositoryTrait + Send + Sync>;

#[async_trait]
pub trait CouponCommandRepositoryTrait {
    async fn create_coupon(
        &self,
        req: &CreateCouponRecordRequest,
    ) -> Result<CouponModel, RepositoryError>;
    async fn set_active(
        &self,
        code: &str,
        active: bool,
    ) -> Result<Option<CouponModel>, RepositoryError>;
}
