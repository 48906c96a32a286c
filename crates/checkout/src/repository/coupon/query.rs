use crate::{
    abstract_trait::coupon::repository::CouponQueryRepositoryTrait,
    model::coupon::Coupon as CouponModel,
};
use async_trait::async_trait;
use shared::{config::ConnectionPool, errors::RepositoryError};
use tracing::error;

#[derive(Clone)]
pub struct CouponQueryRepository {
    db: ConnectionPool,
}

impl CouponQueryRepository {
    pub fn new(db: ConnectionPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CouponQueryRepositoryTrait for CouponQueryRepository {
    async fn find_by_code(&self, code: &str) -> Result<Option<CouponModel>, RepositoryError> {
        let mut conn = self.db.acquire().await.map_err(RepositoryError::from)?;

        sqlx::query_as::<_, CouponModel>(
            r#"
            SELECT coupon_id, code, discount_type, value, min_total, active,
                   start_date, end_date, created_at
            FROM coupons
            WHERE code = $1
            "#,
        )
        .bind(code)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| {
            error!("❌ Failed to fetch coupon {}: {:?}", code, e);
            RepositoryError::from(e)
        })
    }
}
