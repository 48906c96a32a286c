use crate::{
    abstract_trait::cart::repository::CartCommandRepositoryTrait,
    domain::requests::cart::{CreateCartItemRecordRequest, UpdateCartItemRecordRequest},
    model::{cart::Cart as CartModel, cart_item::CartItem as CartItemModel},
};
use async_trait::async_trait;
use shared::{config::ConnectionPool, errors::RepositoryError};
use tracing::{error, info, warn};

#[derive(Clone)]
pub struct CartCommandRepository {
    db: ConnectionPool,
}

impl CartCommandRepository {
    pub fn new(db: ConnectionPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CartCommandRepositoryTrait for CartCommandRepository {
    async fn create_active_cart(&self, user_id: i32) -> Result<CartModel, RepositoryError> {
        let mut conn = self.db.acquire().await.map_err(RepositoryError::from)?;

        let inserted = sqlx::query_as::<_, CartModel>(
            r#"
            INSERT INTO carts (user_id, status)
            VALUES ($1, 'active')
            ON CONFLICT (user_id) WHERE status = 'active' DO NOTHING
            RETURNING cart_id, user_id, status, created_at, updated_at
            "#,
        )
        .bind(user_id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|err| {
            error!("❌ Failed to create cart for user {}: {:?}", user_id, err);
            RepositoryError::classify(err)
        })?;

        if let Some(cart) = inserted {
            info!("🛒 Created cart ID {} for user {}", cart.cart_id, user_id);
            return Ok(cart);
        }

        // lost the race against a concurrent creator; its row is the active cart
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
        .map_err(RepositoryError::classify)?
        .ok_or(RepositoryError::NotFound)
    }

    async fn upsert_item(
        &self,
        req: &CreateCartItemRecordRequest,
    ) -> Result<Option<CartItemModel>, RepositoryError> {
        let mut conn = self.db.acquire().await.map_err(RepositoryError::from)?;

        let item = sqlx::query_as::<_, CartItemModel>(
            r#"
            INSERT INTO cart_items (cart_id, product_id, quantity, unit_price)
            SELECT $1, $2, $3, $4
            WHERE EXISTS (
                SELECT 1 FROM carts
                WHERE cart_id = $1 AND status = 'active'
                FOR SHARE
            )
            ON CONFLICT (cart_id, product_id) DO UPDATE
            SET quantity   = EXCLUDED.quantity,
                unit_price = EXCLUDED.unit_price,
                updated_at = current_timestamp
            RETURNING cart_item_id, cart_id, product_id, quantity, unit_price, created_at, updated_at
            "#,
        )
        .bind(req.cart_id)
        .bind(req.product_id)
        .bind(req.quantity)
        .bind(req.unit_price)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|err| {
            error!(
                "❌ Failed to upsert product {} into cart {}: {:?}",
                req.product_id, req.cart_id, err
            );
            RepositoryError::classify(err)
        })?;

        match &item {
            Some(item) => info!(
                "✅ Cart {} now holds {} x product {}",
                item.cart_id, item.quantity, item.product_id
            ),
            None => warn!("⚠️ Cart {} is no longer active, item not stored", req.cart_id),
        }
        Ok(item)
    }

    async fn update_item(
        &self,
        req: &UpdateCartItemRecordRequest,
    ) -> Result<Option<CartItemModel>, RepositoryError> {
        let mut conn = self.db.acquire().await.map_err(RepositoryError::from)?;

        let item = sqlx::query_as::<_, CartItemModel>(
            r#"
            UPDATE cart_items
            SET quantity   = $3,
                unit_price = $4,
                updated_at = current_timestamp
            WHERE cart_id = $1 AND cart_item_id = $2
              AND EXISTS (
                  SELECT 1 FROM carts
                  WHERE cart_id = $1 AND status = 'active'
                  FOR SHARE
              )
            RETURNING cart_item_id, cart_id, product_id, quantity, unit_price, created_at, updated_at
            "#,
        )
        .bind(req.cart_id)
        .bind(req.cart_item_id)
        .bind(req.quantity)
        .bind(req.unit_price)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|err| {
            error!(
                "❌ Failed to update cart item {}: {:?}",
                req.cart_item_id, err
            );
            RepositoryError::classify(err)
        })?;

        Ok(item)
    }

    async fn delete_item(&self, cart_id: i32, cart_item_id: i32) -> Result<bool, RepositoryError> {
        let mut conn = self.db.acquire().await.map_err(RepositoryError::from)?;

        let result = sqlx::query(
            r#"
            DELETE FROM cart_items
            WHERE cart_id = $1 AND cart_item_id = $2
            "#,
        )
        .bind(cart_id)
        .bind(cart_item_id)
        .execute(&mut *conn)
        .await
        .map_err(|err| {
            error!("❌ Failed to delete cart item {}: {:?}", cart_item_id, err);
            RepositoryError::classify(err)
        })?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_item_by_product(
        &self,
        cart_id: i32,
        product_id: i32,
    ) -> Result<bool, RepositoryError> {
        let mut conn = self.db.acquire().await.map_err(RepositoryError::from)?;

        let result = sqlx::query(
            r#"
            DELETE FROM cart_items
            WHERE cart_id = $1 AND product_id = $2
            "#,
        )
        .bind(cart_id)
        .bind(product_id)
        .execute(&mut *conn)
        .await
        .map_err(|err| {
            error!(
                "❌ Failed to remove product {} from cart {}: {:?}",
                product_id, cart_id, err
            );
            RepositoryError::classify(err)
        })?;

        Ok(result.rows_affected() > 0)
    }

    async fn mark_abandoned(&self, cart_id: i32) -> Result<CartModel, RepositoryError> {
        info!("🗑️ Abandoning cart: {}", cart_id);

        let mut conn = self.db.acquire().await.map_err(RepositoryError::from)?;

        sqlx::query_as::<_, CartModel>(
            r#"
            UPDATE carts
            SET status = 'abandoned', updated_at = current_timestamp
            WHERE cart_id = $1 AND status = 'active'
            RETURNING cart_id, user_id, status, created_at, updated_at
            "#,
        )
        .bind(cart_id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|err| {
            error!("❌ Failed to abandon cart {}: {:?}", cart_id, err);
            RepositoryError::classify(err)
        })?
        .ok_or(RepositoryError::NotFound)
    }
}
