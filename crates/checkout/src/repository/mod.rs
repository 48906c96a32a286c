pub mod cart;
pub mod coupon;
pub mod order;
pub mod product;
pub mod stock;
pub mod transaction;
