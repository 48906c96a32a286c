use crate::model::{order::Order as OrderModel, order_item::OrderItem as OrderItemModel};
use async_trait::async_trait;
use shared::errors::RepositoryError;
use std::sync::Arc;

pub type DynOrderQueryRepository = Arc<dyn OrderQueryRepositoryTrait + Send + Sync>;

#[async_trait]
pub trait OrderQueryRepositoryTrait {
    async fn find_by_id(&self, order_id: i32) -> Result<Option<OrderModel>, RepositoryError>;
    async fn find_items(&self, order_id: i32) -> Result<Vec<OrderItemModel>, RepositoryError>;
    async fn find_by_user(
        &self,
        user_id: i32,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<OrderModel>, i64), RepositoryError>;
}
