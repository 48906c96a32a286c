use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Validate, Clone)]
pub struct CreateOrderFromCartRequest {
    #[validate(range(min = 1))]
    pub user_id: i32,

    #[validate(length(min = 1, max = 1000))]
    pub shipping_address: String,

    pub coupon_code: Option<String>,
}
