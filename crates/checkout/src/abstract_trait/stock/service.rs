use crate::domain::{
    requests::stock::{FindAllStockMovements, StockAdjustmentRequest},
    response::stock::{
        LedgerReconciliationResponse, LowStockResponse, StockAdjustmentResponse,
        StockMovementResponse,
    },
};
use async_trait::async_trait;
use shared::{
    domain::responses::{ApiResponse, ApiResponsePagination},
    errors::ServiceError,
};
use std::sync::Arc;

pub type DynStockService = Arc<dyn StockServiceTrait + Send + Sync>;

#[async_trait]
pub trait StockServiceTrait {
    async fn adjust(
        &self,
        req: &StockAdjustmentRequest,
    ) -> Result<ApiResponse<StockAdjustmentResponse>, ServiceError>;
    async fn list_movements(
        &self,
        req: &FindAllStockMovements,
    ) -> Result<ApiResponsePagination<Vec<StockMovementResponse>>, ServiceError>;
    async fn list_low_stock(
        &self,
        threshold: i32,
    ) -> Result<ApiResponse<Vec<LowStockResponse>>, ServiceError>;
    async fn reconcile(
        &self,
        product_id: i32,
        opening_stock: i64,
    ) -> Result<ApiResponse<LedgerReconciliationResponse>, ServiceError>;
}
