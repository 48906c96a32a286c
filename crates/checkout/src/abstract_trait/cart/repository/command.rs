use crate::{
    domain::requests::cart::{CreateCartItemRecordRequest, UpdateCartItemRecordRequest},
    model::{cart::Cart as CartModel, cart_item::CartItem as CartItemModel},
};
use async_trait::async_trait;
use shared::errors::RepositoryError;
use std::sync::Arc;

pub type DynCartCommandRepository = Arc<dyn CartCommandRepositoryTrait + Send + Sync>;

#[async_trait]
pub trait CartCommandRepositoryTrait {
    /// Returns the user's active cart, creating it if there is none. Concurrent
    /// callers for the same user converge on a single row.
    async fn create_active_cart(&self, user_id: i32) -> Result<CartModel, RepositoryError>;
    /// Inserts or replaces the line for the product. Returns `None` without
    /// writing when the cart is no longer active.
    async fn upsert_item(
        &self,
        req: &CreateCartItemRecordRequest,
    ) -> Result<Option<CartItemModel>, RepositoryError>;
    /// Same active-cart condition as `upsert_item`.
    async fn update_item(
        &self,
        req: &UpdateCartItemRecordRequest,
    ) -> Result<Option<CartItemModel>, RepositoryError>;
    async fn delete_item(&self, cart_id: i32, cart_item_id: i32) -> Result<bool, RepositoryError>;
    async fn delete_item_by_product(
        &self,
        cart_id: i32,
        product_id: i32,
    ) -> Result<bool, RepositoryError>;
    async fn mark_abandoned(&self, cart_id: i32) -> Result<CartModel, RepositoryError>;
}
