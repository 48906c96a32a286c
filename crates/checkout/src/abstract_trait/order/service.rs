use crate::domain::{
    requests::order::FindOrdersByUser,
    response::order::{OrderDetailResponse, OrderResponse},
};
use async_trait::async_trait;
use shared::{
    domain::responses::{ApiResponse, ApiResponsePagination},
    errors::ServiceError,
};
use std::sync::Arc;

pub type DynOrderQueryService = Arc<dyn OrderQueryServiceTrait + Send + Sync>;

#[async_trait]
pub trait OrderQueryServiceTrait {
    async fn find_order(
        &self,
        user_id: i32,
        order_id: i32,
    ) -> Result<ApiResponse<OrderDetailResponse>, ServiceError>;
    async fn find_orders_by_user(
        &self,
        req: &FindOrdersByUser,
    ) -> Result<ApiResponsePagination<Vec<OrderResponse>>, ServiceError>;
}
