use crate::{
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
use shared::errors::RepositoryError;
use std::sync::Arc;

pub type DynUnitOfWork = Arc<dyn UnitOfWorkTrait + Send + Sync>;
pub type BoxedTransaction = Box<dyn TransactionTrait + Send>;

/// Opens all-or-nothing units of work against the store.
#[async_trait]
pub trait UnitOfWorkTrait {
    async fn begin(&self) -> Result<BoxedTransaction, RepositoryError>;
}

/// A single open transaction.
///
/// Row locks taken through `lock_*` are held until `commit` or `rollback`.
/// Dropping the transaction without committing rolls it back.
#[async_trait]
pub trait TransactionTrait {
    /// Locks the user's active cart row. Returns `None` when the user has no
    /// active cart, including when a concurrent checkout closed it while this
    /// call was waiting for the lock.
    async fn lock_active_cart(&mut self, user_id: i32)
    -> Result<Option<CartModel>, RepositoryError>;

    async fn find_cart_items(&mut self, cart_id: i32) -> Result<Vec<CartItemModel>, RepositoryError>;

    /// Exclusively locks the given product rows in ascending id order and
    /// returns their current values. Unknown ids are left out of the result.
    async fn lock_products(
        &mut self,
        product_ids: &[i32],
    ) -> Result<Vec<ProductModel>, RepositoryError>;

    async fn find_coupon_by_code(
        &mut self,
        code: &str,
    ) -> Result<Option<CouponModel>, RepositoryError>;

    async fn insert_order(
        &mut self,
        req: &CreateOrderRecordRequest,
    ) -> Result<OrderModel, RepositoryError>;

    async fn insert_order_item(
        &mut self,
        req: &CreateOrderItemRecordRequest,
    ) -> Result<OrderItemModel, RepositoryError>;

    /// Writes a new stock value for a product previously locked in this transaction.
    async fn update_stock(&mut self, product_id: i32, stock: i32) -> Result<(), RepositoryError>;

    async fn insert_movement(
        &mut self,
        req: &CreateStockMovementRecordRequest,
    ) -> Result<StockMovementModel, RepositoryError>;

    async fn mark_cart_checked_out(&mut self, cart_id: i32) -> Result<(), RepositoryError>;

    async fn commit(self: Box<Self>) -> Result<(), RepositoryError>;

    async fn rollback(self: Box<Self>) -> Result<(), RepositoryError>;
}
