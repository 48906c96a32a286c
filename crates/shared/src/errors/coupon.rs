use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CouponError {
    #[error("Coupon {0} not found")]
    NotFound(String),

    #[error("Coupon {0} is not active yet")]
    NotYetActive(String),

    #[error("Coupon {0} has expired")]
    Expired(String),

    #[error("Coupon {code} requires a minimum spend of {min_total} (subtotal {subtotal})")]
    MinimumNotMet {
        code: String,
        min_total: i64,
        subtotal: i64,
    },
}

impl CouponError {
    pub fn kind(&self) -> &'static str {
        match self {
            CouponError::NotFound(_) => "coupon_not_found",
            CouponError::NotYetActive(_) => "coupon_not_yet_active",
            CouponError::Expired(_) => "coupon_expired",
            CouponError::MinimumNotMet { .. } => "coupon_minimum_not_met",
        }
    }
}
