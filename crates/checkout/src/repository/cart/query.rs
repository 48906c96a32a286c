use crate::{
    abstract_trait::cart::repository::CartQueryRepositoryTrait,
    model::{cart::Cart as CartModel, cart_item::CartItem as CartItemModel},
};
use async_trait::async_trait;
use shared::{config::ConnectionPool, errors::RepositoryError};
use tracing::error;

#[derive(Clone)]
pub struct CartQueryRepository {
    db: ConnectionPool,
}

impl CartQueryRepository {
    pub fn new(db: ConnectionPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CartQueryRepositoryTrait for CartQueryRepository {
    async fn find_active_by_user(&self, user_id: i32) -> Result<Option<CartModel>, RepositoryError> {
        let mut conn = self.db.acquire().await.map_err(|e| {
            error!("❌ Failed to acquire DB connection: {:?}", e);
            RepositoryError::from(e)
        })?;

        sqlx::query_as::<_, CartModel>(
            r#"
            SELECT cart_id, user_id, status, created_at, updated_at
            FROM carts
            WHERE user_id = $1 AND status = 'active'
            "#,
        )
        .bind(user_id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| {
            error!("❌ Failed to fetch active cart for user {}: {:?}", user_id, e);
            RepositoryError::from(e)
        })
    }

    async fn find_by_id(&self, cart_id: i32) -> Result<Option<CartModel>, RepositoryError> {
        let mut conn = self.db.acquire().await.map_err(RepositoryError::from)?;

        sqlx::query_as::<_, CartModel>(
            r#"
            SELECT cart_id, user_id, status, created_at, updated_at
            FROM carts
            WHERE cart_id = $1
            "#,
        )
        .bind(cart_id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(RepositoryError::from)
    }

    async fn find_items(&self, cart_id: i32) -> Result<Vec<CartItemModel>, RepositoryError> {
        let mut conn = self.db.acquire().await.map_err(RepositoryError::from)?;

        sqlx::query_as::<_, CartItemModel>(
            r#"
            SELECT cart_item_id, cart_id, product_id, quantity, unit_price, created_at, updated_at
            FROM cart_items
            WHERE cart_id = $1
            ORDER BY cart_item_id
            "#,
        )
        .bind(cart_id)
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| {
            error!("❌ Failed to fetch items for cart {}: {:?}", cart_id, e);
            RepositoryError::from(e)
        })
    }

    async fn find_item_by_id(
        &self,
        cart_id: i32,
        cart_item_id: i32,
    ) -> Result<Option<CartItemModel>, RepositoryError> {
        let mut conn = self.db.acquire().await.map_err(RepositoryError::from)?;

        sqlx::query_as::<_, CartItemModel>(
            r#"
            SELECT cart_item_id, cart_id, product_id, quantity, unit_price, created_at, updated_at
            FROM cart_items
            WHERE cart_id = $1 AND cart_item_id = $2
            "#,
        )
        .bind(cart_id)
        .bind(cart_item_id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(RepositoryError::from)
    }

    async fn find_item_by_product(
        &self,
        cart_id: i32,
        product_id: i32,
    ) -> Result<Option<CartItemModel>, RepositoryError> {
        let mut conn = self.db.acquire().await.map_err(RepositoryError::from)?;

        sqlx::query_as::<_, CartItemModel>(
            r#"
            SELECT cart_item_id, cart_id, product_id, quantity, unit_price, created_at, updated_at
            FROM cart_items
            WHERE cart_id = $1 AND product_id = $2
            "#,
        )
        .bind(cart_id)
        .bind(product_id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(RepositoryError::from)
    }
}
