pub mod cart;
pub mod coupon;
pub mod order;
pub mod stock;
