mod evaluator;
mod service;

pub use self::evaluator::{AppliedDiscount, compute_discount, evaluate, evaluate_lenient};
pub use self::service::{CouponService, CouponServiceDeps};
