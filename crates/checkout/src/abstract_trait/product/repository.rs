use crate::model::product::Product as ProductModel;
use async_trait::async_trait;
use shared::errors::RepositoryError;
use std::sync::Arc;

pub type DynProductQueryRepository = Arc<dyn ProductQueryRepositoryTrait + Send + Sync>;

/// Read access to the catalog's products. Products are owned by the catalog;
/// this core only reads them outside of a transaction.
#[async_trait]
pub trait ProductQueryRepositoryTrait {
    async fn find_by_id(&self, product_id: i32) -> Result<Option<ProductModel>, RepositoryError>;
    async fn find_by_ids(&self, product_ids: &[i32]) -> Result<Vec<ProductModel>, RepositoryError>;
    async fn find_low_stock(&self, threshold: i32) -> Result<Vec<ProductModel>, RepositoryError>;
}
