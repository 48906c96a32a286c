use crate::{
    domain::requests::stock::FindAllStockMovements,
    model::stock_movement::StockMovement as StockMovementModel,
};
use async_trait::async_trait;
use shared::errors::RepositoryError;
use std::sync::Arc;

pub type DynStockMovementQueryRepository =
    Arc<dyn StockMovementQueryRepositoryTrait + Send + Sync>;

#[async_trait]
pub trait StockMovementQueryRepositoryTrait {
    async fn find_movements(
        &self,
        req: &FindAllStockMovements,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<StockMovementModel>, i64), RepositoryError>;
    /// Sum of the signed deltas of every movement recorded for the product.
    async fn sum_deltas(&self, product_id: i32) -> Result<i64, RepositoryError>;
}
