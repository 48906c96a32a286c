use crate::model::coupon::Coupon as CouponModel;
use async_trait::async_trait;
use shared::errors::RepositoryError;
use std::sync::Arc;

pub type DynCouponQueryRepository = Arc<dyn CouponQueryRepositoryTrait + Send + Sync>;

#[async_trait]
pub trait CouponQueryRepositoryTrait {
    async fn find_by_code(&self, code: &str) -> Result<Option<CouponModel>, RepositoryError>;
}
