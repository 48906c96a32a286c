use crate::model::coupon::{Coupon as CouponModel, CouponType};
use chrono::NaiveDateTime;
use shared::errors::CouponError;
use tracing::info;

/// A coupon that passed evaluation against a concrete subtotal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedDiscount {
    pub coupon_id: i32,
    pub code: String,
    pub discount_amount: i64,
}

/// Discount in minor units for `subtotal`, never more than the subtotal itself.
pub fn compute_discount(discount_type: CouponType, value: i64, subtotal: i64) -> i64 {
    if subtotal <= 0 || value <= 0 {
        return 0;
    }

    let raw = match discount_type {
        CouponType::Percent => {
            let pct = i128::from(value.min(100));
            let amount = i128::from(subtotal) * pct / 100;
            i64::try_from(amount).unwrap_or(subtotal)
        }
        CouponType::Fixed => value,
    };

    raw.clamp(0, subtotal)
}

/// Strict evaluation. The first failing rule wins, checked in the order
/// active flag, start of window, end of window, minimum spend. A deactivated
/// coupon is reported as not found.
pub fn evaluate(
    coupon: &CouponModel,
    subtotal: i64,
    now: NaiveDateTime,
) -> Result<AppliedDiscount, CouponError> {
    if !coupon.active {
        return Err(CouponError::NotFound(coupon.code.clone()));
    }

    if now < coupon.start_date {
        return Err(CouponError::NotYetActive(coupon.code.clone()));
    }

    if let Some(end) = coupon.end_date
        && now > end
    {
        return Err(CouponError::Expired(coupon.code.clone()));
    }

    if subtotal < coupon.min_total {
        return Err(CouponError::MinimumNotMet {
            code: coupon.code.clone(),
            min_total: coupon.min_total,
            subtotal,
        });
    }

    Ok(AppliedDiscount {
        coupon_id: coupon.coupon_id,
        code: coupon.code.clone(),
        discount_amount: compute_discount(coupon.discount_type, coupon.value, subtotal),
    })
}

/// Checkout-time evaluation: any rejection, including an unknown code,
/// degrades to no discount.
pub fn evaluate_lenient(
    coupon: Option<&CouponModel>,
    subtotal: i64,
    now: NaiveDateTime,
) -> Option<AppliedDiscount> {
    let coupon = coupon?;

    match evaluate(coupon, subtotal, now) {
        Ok(applied) => Some(applied),
        Err(rejection) => {
            info!("🎟️ Coupon ignored at checkout: {}", rejection);
            None
        }
    }
}
