use crate::domain::{
    requests::cart::{AddCartItemRequest, MergeGuestCartRequest, UpdateCartItemRequest},
    response::cart::{CartResponse, MergeCartResponse},
};
use async_trait::async_trait;
use shared::{domain::responses::ApiResponse, errors::ServiceError};
use std::sync::Arc;

pub type DynCartService = Arc<dyn CartServiceTrait + Send + Sync>;

#[async_trait]
pub trait CartServiceTrait {
    async fn get_cart(&self, user_id: i32) -> Result<ApiResponse<CartResponse>, ServiceError>;
    async fn add_item(
        &self,
        req: &AddCartItemRequest,
    ) -> Result<ApiResponse<CartResponse>, ServiceError>;
    async fn update_item(
        &self,
        req: &UpdateCartItemRequest,
    ) -> Result<ApiResponse<CartResponse>, ServiceError>;
    async fn remove_item(
        &self,
        user_id: i32,
        cart_item_id: i32,
    ) -> Result<ApiResponse<CartResponse>, ServiceError>;
    async fn merge_guest_items(
        &self,
        req: &MergeGuestCartRequest,
    ) -> Result<ApiResponse<MergeCartResponse>, ServiceError>;
    async fn abandon_cart(&self, user_id: i32) -> Result<ApiResponse<()>, ServiceError>;
}
