pub mod cart;
pub mod checkout;
pub mod coupon;
pub mod order;
pub mod stock;
