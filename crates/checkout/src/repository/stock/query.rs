use crate::{
    abstract_trait::stock::StockMovementQueryRepositoryTrait,
    domain::requests::stock::FindAllStockMovements,
    model::stock_movement::StockMovement as StockMovementModel,
};
use async_trait::async_trait;
use shared::{config::ConnectionPool, errors::RepositoryError};
use sqlx::FromRow;
use tracing::{error, info};

#[derive(Clone)]
pub struct StockMovementQueryRepository {
    db: ConnectionPool,
}

impl StockMovementQueryRepository {
    pub fn new(db: ConnectionPool) -> Self {
        Self { db }
    }
}

#[derive(FromRow)]
struct MovementRowWithCount {
    #[sqlx(flatten)]
    movement: StockMovementModel,
    total_count: i64,
}

#[async_trait]
impl StockMovementQueryRepositoryTrait for StockMovementQueryRepository {
    async fn find_movements(
        &self,
        req: &FindAllStockMovements,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<StockMovementModel>, i64), RepositoryError> {
        info!(
            "🔍 Fetching stock movements | product={:?}, type={:?}, limit={}, offset={}",
            req.product_id, req.movement_type, limit, offset
        );

        let mut conn = self.db.acquire().await.map_err(RepositoryError::from)?;

        let rows = sqlx::query_as::<_, MovementRowWithCount>(
            r#"
            SELECT movement_id, product_id, movement_type, qty, reason, created_at,
                   COUNT(*) OVER() AS total_count
            FROM stock_movements
            WHERE ($1::INT IS NULL OR product_id = $1)
              AND ($2::stock_movement_type IS NULL OR movement_type = $2)
            ORDER BY created_at DESC, movement_id DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(req.product_id)
        .bind(req.movement_type)
        .bind(limit)
        .bind(offset)
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| {
            error!("❌ Failed to fetch stock movements: {:?}", e);
            RepositoryError::from(e)
        })?;

        let total = match rows.first() {
            Some(row) => row.total_count,
            None if offset > 0 => sqlx::query_scalar::<_, i64>(
                r#"
                SELECT COUNT(*)
                FROM stock_movements
                WHERE ($1::INT IS NULL OR product_id = $1)
                  AND ($2::stock_movement_type IS NULL OR movement_type = $2)
                "#,
            )
            .bind(req.product_id)
            .bind(req.movement_type)
            .fetch_one(&mut *conn)
            .await
            .map_err(RepositoryError::from)?,
            None => 0,
        };
        let movements = rows.into_iter().map(|row| row.movement).collect();

        Ok((movements, total))
    }

    async fn sum_deltas(&self, product_id: i32) -> Result<i64, RepositoryError> {
        let mut conn = self.db.acquire().await.map_err(RepositoryError::from)?;

        let total = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COALESCE(SUM(
                CASE movement_type
                    WHEN 'out' THEN -qty
                    ELSE qty
                END
            ), 0)::BIGINT
            FROM stock_movements
            WHERE product_id = $1
            "#,
        )
        .bind(product_id)
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| {
            error!("❌ Failed to sum movements for product {}: {:?}", product_id, e);
            RepositoryError::from(e)
        })?;

        Ok(total)
    }
}
