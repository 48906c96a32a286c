use crate::{
    abstract_trait::product::ProductQueryRepositoryTrait, model::product::Product as ProductModel,
};
use async_trait::async_trait;
use shared::{config::ConnectionPool, errors::RepositoryError};
use tracing::error;

#[derive(Clone)]
pub struct ProductQueryRepository {
    db: ConnectionPool,
}

impl ProductQueryRepository {
    pub fn new(db: ConnectionPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ProductQueryRepositoryTrait for ProductQueryRepository {
    async fn find_by_id(&self, product_id: i32) -> Result<Option<ProductModel>, RepositoryError> {
        let mut conn = self.db.acquire().await.map_err(RepositoryError::from)?;

        sqlx::query_as::<_, ProductModel>(
            r#"
            SELECT product_id, name, price, stock, is_active, created_at, updated_at
            FROM products
            WHERE product_id = $1
            "#,
        )
        .bind(product_id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| {
            error!("❌ Failed to fetch product {}: {:?}", product_id, e);
            RepositoryError::from(e)
        })
    }

    async fn find_by_ids(&self, product_ids: &[i32]) -> Result<Vec<ProductModel>, RepositoryError> {
        let mut conn = self.db.acquire().await.map_err(RepositoryError::from)?;

        sqlx::query_as::<_, ProductModel>(
            r#"
            SELECT product_id, name, price, stock, is_active, created_at, updated_at
            FROM products
            WHERE product_id = ANY($1)
            ORDER BY product_id
            "#,
        )
        .bind(product_ids)
        .fetch_all(&mut *conn)
        .await
        .map_err(RepositoryError::from)
    }

    async fn find_low_stock(&self, threshold: i32) -> Result<Vec<ProductModel>, RepositoryError> {
        let mut conn = self.db.acquire().await.map_err(RepositoryError::from)?;

        sqlx::query_as::<_, ProductModel>(
            r#"
            SELECT product_id, name, price, stock, is_active, created_at, updated_at
            FROM products
            WHERE stock <= $1 AND is_active
            ORDER BY stock ASC, product_id ASC
            "#,
        )
        .bind(threshold)
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| {
            error!("❌ Failed to fetch low-stock products: {:?}", e);
            RepositoryError::from(e)
        })
    }
}
