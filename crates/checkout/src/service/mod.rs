mod cart;
mod checkout;
pub mod coupon;
mod order;
mod publisher;
mod stock;

pub use self::cart::{CartService, CartServiceDeps};
pub use self::checkout::{CheckoutService, CheckoutServiceDeps};
pub use self::coupon::{CouponService, CouponServiceDeps};
pub use self::order::OrderQueryService;
pub use self::publisher::EventPublisher;
pub use self::stock::{StockService, StockServiceDeps};
