use crate::domain::{requests::checkout::CreateOrderFromCartRequest, response::order::OrderDetailResponse};
use async_trait::async_trait;
use shared::{domain::responses::ApiResponse, errors::ServiceError};
use std::sync::Arc;

pub type DynCheckoutService = Arc<dyn CheckoutServiceTrait + Send + Sync>;

#[async_trait]
pub trait CheckoutServiceTrait {
    /// Converts the caller's active cart into an order in one transaction.
    ///
    /// Fails with `NoActiveCart`, `EmptyCart` or `InsufficientStock`; on any
    /// failure nothing is written and the cart stays active.
    async fn create_order_from_cart(
        &self,
        req: &CreateOrderFromCartRequest,
    ) -> Result<ApiResponse<OrderDetailResponse>, ServiceError>;
}
