use crate::{
    abstract_trait::coupon::repository::CouponCommandRepositoryTrait,
    domain::requests::coupon::CreateCouponRecordRequest, model::coupon::Coupon as CouponModel,
};
use async_trait::async_trait;
use shared::{config::ConnectionPool, errors::RepositoryError};
use tracing::{error, info};

#[derive(Clone)]
pub struct CouponCommandRepository {
    db: ConnectionPool,
}

impl CouponCommandRepository {
    pub fn new(db: ConnectionPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CouponCommandRepositoryTrait for CouponCommandRepository {
    async fn create_coupon(
        &self,
        req: &CreateCouponRecordRequest,
    ) -> Result<CouponModel, RepositoryError> {
        info!("🎟️ Creating coupon: {}", req.code);

        let mut conn = self.db.acquire().await.map_err(RepositoryError::from)?;

        let coupon = sqlx::query_as::<_, CouponModel>(
            r#"
            INSERT INTO coupons (code, discount_type, value, min_total, start_date, end_date)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING coupon_id, code, discount_type, value, min_total, active,
                      start_date, end_date, created_at
            "#,
        )
        .bind(&req.code)
        .bind(req.discount_type)
        .bind(req.value)
        .bind(req.min_total)
        .bind(req.start_date)
        .bind(req.end_date)
        .fetch_one(&mut *conn)
        .await
        .map_err(|err| {
            error!("❌ Failed to create coupon {}: {:?}", req.code, err);
            RepositoryError::classify(err)
        })?;

        info!("✅ Coupon {} created with ID {}", coupon.code, coupon.coupon_id);
        Ok(coupon)
    }

    async fn set_active(
        &self,
        code: &str,
        active: bool,
    ) -> Result<Option<CouponModel>, RepositoryError> {
        let mut conn = self.db.acquire().await.map_err(RepositoryError::from)?;

        let coupon = sqlx::query_as::<_, CouponModel>(
            r#"
            UPDATE coupons
            SET active = $2
            WHERE code = $1
            RETURNING coupon_id, code, discount_type, value, min_total, active,
                      start_date, end_date, created_at
            "#,
        )
        .bind(code)
        .bind(active)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|err| {
            error!("❌ Failed to set active={} on coupon {}: {:?}", active, code, err);
            RepositoryError::classify(err)
        })?;

        Ok(coupon)
    }
}
