mod coupon;
mod error;
mod repository;
mod service;

pub use self::coupon::CouponError;
pub use self::error::ErrorResponse;
pub use self::repository::RepositoryError;
pub use self::service::ServiceError;
