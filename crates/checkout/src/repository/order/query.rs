use crate::{
    abstract_trait::order::OrderQueryRepositoryTrait,
    model::{order::Order as OrderModel, order_item::OrderItem as OrderItemModel},
};
use async_trait::async_trait;
use shared::{config::ConnectionPool, errors::RepositoryError};
use sqlx::FromRow;
use tracing::{error, info};

#[derive(Clone)]
pub struct OrderQueryRepository {
    db: ConnectionPool,
}

impl OrderQueryRepository {
    pub fn new(db: ConnectionPool) -> Self {
        Self { db }
    }
}

#[derive(FromRow)]
struct OrderRowWithCount {
    #[sqlx(flatten)]
    order: OrderModel,
    total_count: i64,
}

#[async_trait]
impl OrderQueryRepositoryTrait for OrderQueryRepository {
    async fn find_by_id(&self, order_id: i32) -> Result<Option<OrderModel>, RepositoryError> {
        let mut conn = self.db.acquire().await.map_err(RepositoryError::from)?;

        sqlx::query_as::<_, OrderModel>(
            r#"
            SELECT order_id, user_id, status, payment_status, subtotal, discount_amount,
                   total, coupon_id, shipping_address, created_at, updated_at
            FROM orders
            WHERE order_id = $1
            "#,
        )
        .bind(order_id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| {
            error!("❌ Failed to fetch order {}: {:?}", order_id, e);
            RepositoryError::from(e)
        })
    }

    async fn find_items(&self, order_id: i32) -> Result<Vec<OrderItemModel>, RepositoryError> {
        let mut conn = self.db.acquire().await.map_err(RepositoryError::from)?;

        sqlx::query_as::<_, OrderItemModel>(
            r#"
            SELECT order_item_id, order_id, product_id, quantity, unit_price, created_at
            FROM order_items
            WHERE order_id = $1
            ORDER BY order_item_id
            "#,
        )
        .bind(order_id)
        .fetch_all(&mut *conn)
        .await
        .map_err(RepositoryError::from)
    }

    async fn find_by_user(
        &self,
        user_id: i32,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<OrderModel>, i64), RepositoryError> {
        info!(
            "🔍 Fetching orders for user {} | limit={}, offset={}",
            user_id, limit, offset
        );

        let mut conn = self.db.acquire().await.map_err(RepositoryError::from)?;

        let rows = sqlx::query_as::<_, OrderRowWithCount>(
            r#"
            SELECT order_id, user_id, status, payment_status, subtotal, discount_amount,
                   total, coupon_id, shipping_address, created_at, updated_at,
                   COUNT(*) OVER() AS total_count
            FROM orders
            WHERE user_id = $1
            ORDER BY created_at DESC, order_id DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| {
            error!("❌ Failed to fetch orders for user {}: {:?}", user_id, e);
            RepositoryError::from(e)
        })?;

        let total = match rows.first() {
            Some(row) => row.total_count,
            // past the last page the window count is unavailable
            None if offset > 0 => sqlx::query_scalar::<_, i64>(
                "SELECT COUNT(*) FROM orders WHERE user_id = $1",
            )
            .bind(user_id)
            .fetch_one(&mut *conn)
            .await
            .map_err(RepositoryError::from)?,
            None => 0,
        };

        let orders = rows.into_iter().map(|row| row.order).collect();

        Ok((orders, total))
    }
}
