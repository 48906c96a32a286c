use crate::{
    abstract_trait::transaction::{BoxedTransaction, TransactionTrait, UnitOfWorkTrait},
    domain::requests::{
        order::{CreateOrderItemRecordRequest, CreateOrderRecordRequest},
        stock::CreateStockMovementRecordRequest,
    },
    model::{
        cart::Cart as CartModel, cart_item::CartItem as CartItemModel,
        coupon::Coupon as CouponModel, order::Order as OrderModel,
        order_item::OrderItem as OrderItemModel, product::Product as ProductModel,
        stock_movement::StockMovement as StockMovementModel,
    },
};
use async_trait::async_trait;
use shared::{config::ConnectionPool, errors::RepositoryError};
use sqlx::{Postgres, Transaction};
use std::time::Duration;
use tracing::{error, info};

#[derive(Clone)]
pub struct PgUnitOfWork {
    db: ConnectionPool,
    lock_timeout: Duration,
}

impl PgUnitOfWork {
    pub fn new(db: ConnectionPool, lock_timeout: Duration) -> Self {
        Self { db, lock_timeout }
    }
}

#[async_trait]
impl UnitOfWorkTrait for PgUnitOfWork {
    async fn begin(&self) -> Result<BoxedTransaction, RepositoryError> {
        let mut tx = self.db.begin().await.map_err(|e| {
            error!("❌ Failed to begin transaction: {:?}", e);
            RepositoryError::from(e)
        })?;

        // scoped to this transaction; a blocked row lock fails with 55P03
        sqlx::query("SELECT set_config('lock_timeout', $1, true)")
            .bind(format!("{}ms", self.lock_timeout.as_millis()))
            .execute(&mut *tx)
            .await
            .map_err(RepositoryError::from)?;

        Ok(Box::new(PgTransaction { tx }))
    }
}

pub struct PgTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl TransactionTrait for PgTransaction {
    async fn lock_active_cart(
        &mut self,
        user_id: i32,
    ) -> Result<Option<CartModel>, RepositoryError> {
        sqlx::query_as::<_, CartModel>(
            r#"
            SELECT cart_id, user_id, status, created_at, updated_at
            FROM carts
            WHERE user_id = $1 AND status = 'active'
            FOR UPDATE
            "#,
        )
        .bind(user_id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| {
            error!("❌ Failed to lock active cart for user {}: {:?}", user_id, e);
            RepositoryError::classify(e)
        })
    }

    async fn find_cart_items(
        &mut self,
        cart_id: i32,
    ) -> Result<Vec<CartItemModel>, RepositoryError> {
        sqlx::query_as::<_, CartItemModel>(
            r#"
            SELECT cart_item_id, cart_id, product_id, quantity, unit_price, created_at, updated_at
            FROM cart_items
            WHERE cart_id = $1
            ORDER BY cart_item_id
            "#,
        )
        .bind(cart_id)
        .fetch_all(&mut *self.tx)
        .await
        .map_err(RepositoryError::from)
    }

    async fn lock_products(
        &mut self,
        product_ids: &[i32],
    ) -> Result<Vec<ProductModel>, RepositoryError> {
        sqlx::query_as::<_, ProductModel>(
            r#"
            SELECT product_id, name, price, stock, is_active, created_at, updated_at
            FROM products
            WHERE product_id = ANY($1)
            ORDER BY product_id
            FOR UPDATE
            "#,
        )
        .bind(product_ids)
        .fetch_all(&mut *self.tx)
        .await
        .map_err(|e| {
            error!("❌ Failed to lock products {:?}: {:?}", product_ids, e);
            RepositoryError::classify(e)
        })
    }

    async fn find_coupon_by_code(
        &mut self,
        code: &str,
    ) -> Result<Option<CouponModel>, RepositoryError> {
        sqlx::query_as::<_, CouponModel>(
            r#"
            SELECT coupon_id, code, discount_type, value, min_total, active,
                   start_date, end_date, created_at
            FROM coupons
            WHERE code = $1
            FOR SHARE
            "#,
        )
        .bind(code)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(RepositoryError::classify)
    }

    async fn insert_order(
        &mut self,
        req: &CreateOrderRecordRequest,
    ) -> Result<OrderModel, RepositoryError> {
        let order = sqlx::query_as::<_, OrderModel>(
            r#"
            INSERT INTO orders (user_id, status, payment_status, subtotal, discount_amount,
                                total, coupon_id, shipping_address)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING order_id, user_id, status, payment_status, subtotal, discount_amount,
                      total, coupon_id, shipping_address, created_at, updated_at
            "#,
        )
        .bind(req.user_id)
        .bind(req.status)
        .bind(req.payment_status)
        .bind(req.subtotal)
        .bind(req.discount_amount)
        .bind(req.total)
        .bind(req.coupon_id)
        .bind(&req.shipping_address)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| {
            error!("❌ Failed to insert order for user {}: {:?}", req.user_id, e);
            RepositoryError::classify(e)
        })?;

        info!("📝 Staged order {} for user {}", order.order_id, order.user_id);
        Ok(order)
    }

    async fn insert_order_item(
        &mut self,
        req: &CreateOrderItemRecordRequest,
    ) -> Result<OrderItemModel, RepositoryError> {
        sqlx::query_as::<_, OrderItemModel>(
            r#"
            INSERT INTO order_items (order_id, product_id, quantity, unit_price)
            VALUES ($1, $2, $3, $4)
            RETURNING order_item_id, order_id, product_id, quantity, unit_price, created_at
            "#,
        )
        .bind(req.order_id)
        .bind(req.product_id)
        .bind(req.quantity)
        .bind(req.unit_price)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| {
            error!(
                "❌ Failed to insert item for product {} on order {}: {:?}",
                req.product_id, req.order_id, e
            );
            RepositoryError::classify(e)
        })
    }

    async fn update_stock(&mut self, product_id: i32, stock: i32) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r#"
            UPDATE products
            SET stock = $2, updated_at = current_timestamp
            WHERE product_id = $1
            "#,
        )
        .bind(product_id)
        .bind(stock)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| {
            error!("❌ Failed to set stock of product {}: {:?}", product_id, e);
            RepositoryError::classify(e)
        })?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn insert_movement(
        &mut self,
        req: &CreateStockMovementRecordRequest,
    ) -> Result<StockMovementModel, RepositoryError> {
        sqlx::query_as::<_, StockMovementModel>(
            r#"
            INSERT INTO stock_movements (product_id, movement_type, qty, reason)
            VALUES ($1, $2, $3, $4)
            RETURNING movement_id, product_id, movement_type, qty, reason, created_at
            "#,
        )
        .bind(req.product_id)
        .bind(req.movement_type)
        .bind(req.qty)
        .bind(&req.reason)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| {
            error!(
                "❌ Failed to record {} movement for product {}: {:?}",
                req.movement_type, req.product_id, e
            );
            RepositoryError::classify(e)
        })
    }

    async fn mark_cart_checked_out(&mut self, cart_id: i32) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r#"
            UPDATE carts
            SET status = 'checked_out', updated_at = current_timestamp
            WHERE cart_id = $1 AND status = 'active'
            "#,
        )
        .bind(cart_id)
        .execute(&mut *self.tx)
        .await
        .map_err(RepositoryError::classify)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::Conflict(format!("cart {cart_id} is no longer active")));
        }

        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), RepositoryError> {
        self.tx.commit().await.map_err(|e| {
            error!("❌ Failed to commit transaction: {:?}", e);
            RepositoryError::classify(e)
        })
    }

    async fn rollback(self: Box<Self>) -> Result<(), RepositoryError> {
        self.tx.rollback().await.map_err(RepositoryError::from)
    }
}
