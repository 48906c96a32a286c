use crate::model::{cart::Cart as CartModel, cart_item::CartItem as CartItemModel};
use async_trait::async_trait;
use shared::errors::RepositoryError;
use std::sync::Arc;

pub type DynCartQueryRepository = Arc<dyn CartQueryRepositoryTrait + Send + Sync>;

#[async_trait]
pub trait CartQueryRepositoryTrait {
    async fn find_active_by_user(&self, user_id: i32) -> Result<Option<CartModel>, RepositoryError>;
    async fn find_by_id(&self, cart_id: i32) -> Result<Option<CartModel>, RepositoryError>;
    async fn find_items(&self, cart_id: i32) -> Result<Vec<CartItemModel>, RepositoryError>;
    async fn find_item_by_id(
        &self,
        cart_id: i32,
        cart_item_id: i32,
    ) -> Result<Option<CartItemModel>, RepositoryError>;
    async fn find_item_by_product(
        &self,
        cart_id: i32,
        product_id: i32,
    ) -> Result<Option<CartItemModel>, RepositoryError>;
}
